use regex::Regex;
use reqwest::header::CONTENT_TYPE;
use url::Url;

/// Staged names are a hyphenated UUID followed by the extension
pub fn staged_name_regex(extension: &str) -> Regex {
    Regex::new(&format!(r"^[0-9a-f-]{{36}}\.{}$", regex::escape(extension))).unwrap()
}

/// Value of a query parameter of `url`
pub fn query_param(url: &str, key: &str) -> Option<String> {
    Url::parse(url)
        .unwrap()
        .query_pairs()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.into_owned())
}

/// Upload data through a signed write URL
pub async fn upload_to_signed_url(
    write_url: &str,
    data: &[u8],
    content_type: &str,
) -> Result<reqwest::Response, reqwest::Error> {
    reqwest::Client::new()
        .put(write_url)
        .header(CONTENT_TYPE, content_type)
        .body(data.to_vec())
        .send()
        .await
}

/// Download data through a signed read URL
pub async fn download_from_signed_url(
    read_url: &str,
) -> Result<reqwest::Response, reqwest::Error> {
    reqwest::Client::new().get(read_url).send().await
}
