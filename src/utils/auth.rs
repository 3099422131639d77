//! Authentication headers for API requests.

/// Attach the bearer token used by OpenAI-compatible endpoints.
pub fn add_auth_headers(
    request: reqwest::RequestBuilder,
    api_key: &str,
) -> reqwest::RequestBuilder {
    request.header("Authorization", format!("Bearer {api_key}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adds_bearer_authorization() {
        let client = reqwest::Client::new();
        let request = add_auth_headers(client.post("https://api.example.com/v1"), "sk-test")
            .build()
            .expect("request");
        assert_eq!(
            request.headers().get("Authorization").unwrap(),
            "Bearer sk-test"
        );
    }
}
