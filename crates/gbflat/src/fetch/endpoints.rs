//! E-utilities URL builders

/// efetch endpoint under an E-utilities base URL
pub fn efetch_url(base_url: &str) -> String {
    format!("{}/efetch.fcgi", base_url)
}

/// Query parameters asking efetch for one GenBank flat-file record as text.
/// Values are left raw; the HTTP client encodes them.
pub fn efetch_params<'a>(database: &'a str, id: &'a str, api_key: Option<&'a str>) -> Vec<(&'static str, &'a str)> {
    let mut params = vec![
        ("db", database),
        ("id", id),
        ("rettype", "gb"),
        ("retmode", "text"),
    ];
    if let Some(key) = api_key {
        params.push(("api_key", key));
    }
    params
}
