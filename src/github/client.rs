use anyhow::{Context, Result};
use reqwest::blocking::{Client, RequestBuilder};
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

pub const DEFAULT_GRAPHQL_URL: &str = "https://api.github.com/graphql";
const USER_AGENT: &str = "project-priorities";

#[derive(Debug, Error)]
pub enum GraphqlError {
    /// The request never produced a GraphQL response body.
    #[error("{0:#}")]
    Transport(anyhow::Error),
    /// The server answered with a top-level `errors` collection.
    #[error("{}", .0.join("; "))]
    Errors(Vec<String>),
}

/// Blocking client for a GraphQL endpoint authenticated with a bearer token.
#[derive(Clone)]
pub struct GraphqlClient {
    client: Client,
    token: SecretString,
    endpoint: String,
}

impl GraphqlClient {
    pub fn new(token: SecretString, endpoint: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .context("building HTTP client for GraphQL")?;
        Ok(Self {
            client,
            token,
            endpoint: endpoint.into(),
        })
    }

    fn post(&self) -> RequestBuilder {
        tracing::trace!(endpoint = %self.endpoint, "post");
        self.client
            .post(&self.endpoint)
            .bearer_auth(self.token.expose_secret())
    }

    /// Issues an ad-hoc GraphQL document and returns the raw response body.
    ///
    /// The `errors` array is left for the caller to inspect; only transport
    /// failures and non-2xx statuses are reported as `Err`.
    pub fn graphql_query_with_errors(
        &self,
        query: &str,
        vars: serde_json::Value,
    ) -> Result<serde_json::Value> {
        let body = serde_json::json!({
            "query": query,
            "variables": vars,
        });
        tracing::debug!(endpoint = %self.endpoint, "sending GraphQL request");
        let resp = self
            .post()
            .json(&body)
            .send()
            .with_context(|| format!("sending GraphQL request to {}", self.endpoint))?;

        let maybe_err = resp.error_for_status_ref().err();
        let text = resp
            .text()
            .with_context(|| format!("reading GraphQL response from {}", self.endpoint))?;
        if let Some(e) = maybe_err {
            return Err(anyhow::Error::new(e)).with_context(|| format!("response: {text}"));
        }

        serde_json::from_str(&text).context("decoding GraphQL response JSON")
    }

    /// Issues a GraphQL document, turning a present `errors` array into
    /// [`GraphqlError::Errors`].
    pub fn graphql_query(
        &self,
        query: &str,
        vars: serde_json::Value,
    ) -> Result<serde_json::Value, GraphqlError> {
        let result = self
            .graphql_query_with_errors(query, vars)
            .map_err(GraphqlError::Transport)?;
        if let Some(messages) = error_messages(&result) {
            return Err(GraphqlError::Errors(messages));
        }
        Ok(result)
    }
}

/// Messages of a top-level `errors` collection, if the response carries one.
pub(crate) fn error_messages(response: &serde_json::Value) -> Option<Vec<String>> {
    let errors = response.get("errors")?;
    let messages = match errors.as_array() {
        Some(list) => list
            .iter()
            .map(|err| match err["message"].as_str() {
                Some(message) => message.to_string(),
                None => err.to_string(),
            })
            .collect(),
        None => vec![errors.to_string()],
    };
    Some(messages)
}
