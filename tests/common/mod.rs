use testutil::{QueryValues, TestServer};

pub mod test_helpers {
    use super::*;

    pub async fn setup_test_server() -> TestServer {
        testutil::logging::init_test_logging();
        TestServer::start().await.expect("Failed to start test server")
    }

    /// Fetches `url` and returns the status code and body text
    pub async fn fetch(server: &TestServer, url: &str) -> (u16, String) {
        let response = server
            .client()
            .get(url)
            .send()
            .await
            .expect("request to test server failed");
        let status = response.status().as_u16();
        let body = response.text().await.expect("Failed to read response body");
        (status, body)
    }

    /// Query with a single key holding `values` in order
    pub fn query(key: &str, values: &[&str]) -> QueryValues {
        let mut query = QueryValues::new();
        query.insert(
            key.to_string(),
            values.iter().map(|v| v.to_string()).collect(),
        );
        query
    }
}
