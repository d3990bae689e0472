use crate::session::rollup_query::{
    InputResults,
    QueryError,
    RollupQuery,
};
use anyhow::{
    Context,
    anyhow,
};
use serde::Deserialize;
use serde_json::json;
use url::Url;

/// `RollupQuery` implementation over the rollup node's GraphQL endpoint.
/// Payloads travel as `0x…` hex strings and are handed out as bytes.
pub struct GraphQlRollupClient {
    client: reqwest::Client,
    url: Url,
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    data: Option<serde_json::Value>,
    errors: Option<Vec<GraphQlError>>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct Connection {
    edges: Vec<Edge>,
}

#[derive(Debug, Deserialize)]
struct Edge {
    node: OutputNode,
}

#[derive(Debug, Deserialize)]
struct OutputNode {
    payload: String,
}

#[derive(Debug, Deserialize)]
struct NoticesData {
    notices: Connection,
}

#[derive(Debug, Deserialize)]
struct InputData {
    input: Option<InputNode>,
}

#[derive(Debug, Deserialize)]
struct InputNode {
    #[serde(default)]
    notices: Option<Connection>,
    #[serde(default)]
    reports: Option<Connection>,
}

impl GraphQlRollupClient {
    pub fn new(url: Url) -> Self {
        Self {
            client: reqwest::Client::new(),
            url,
        }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    async fn execute(&self, query: String) -> Result<serde_json::Value, QueryError> {
        tracing::debug!(%query, "executing GraphQL query");
        let response = self
            .client
            .post(self.url.clone())
            .json(&json!({ "query": query }))
            .send()
            .await
            .context("sending GraphQL query")?;
        let body: GraphQlResponse = response
            .json()
            .await
            .context("reading GraphQL response")?;

        if let Some(errors) = body.errors {
            // The node answers a lookup for an unprocessed input with a
            // query error rather than a null field.
            if errors
                .iter()
                .any(|err| err.message.to_lowercase().contains("not found"))
            {
                return Err(QueryError::NotFound);
            }
            let messages: Vec<String> =
                errors.into_iter().map(|err| err.message).collect();
            return Err(QueryError::Transport(anyhow!(
                "GraphQL query failed: {}",
                messages.join("; ")
            )));
        }

        body.data
            .ok_or_else(|| QueryError::Transport(anyhow!("GraphQL response carried no data")))
    }
}

impl RollupQuery for GraphQlRollupClient {
    async fn notices(&self) -> Result<Vec<Vec<u8>>, QueryError> {
        let data = self
            .execute("{ notices { edges { node { payload } } } }".to_string())
            .await?;
        let data: NoticesData = parse_data(data)?;
        connection_payloads(data.notices)
    }

    async fn notice(&self, input_index: u64) -> Result<Vec<u8>, QueryError> {
        let query = format!(
            "{{ input(index: {input_index}) {{ notices {{ edges {{ node {{ payload }} }} }} }} }}"
        );
        let data: InputData = parse_data(self.execute(query).await?)?;
        let connection = data
            .input
            .and_then(|input| input.notices)
            .ok_or(QueryError::NotFound)?;
        first_payload(connection)
    }

    async fn report(&self, input_index: u64) -> Result<Vec<u8>, QueryError> {
        let query = format!(
            "{{ input(index: {input_index}) {{ reports {{ edges {{ node {{ payload }} }} }} }} }}"
        );
        let data: InputData = parse_data(self.execute(query).await?)?;
        let connection = data
            .input
            .and_then(|input| input.reports)
            .ok_or(QueryError::NotFound)?;
        first_payload(connection)
    }

    async fn input_results(&self, input_index: u64) -> Result<InputResults, QueryError> {
        let query = format!(
            "{{ input(index: {input_index}) {{ \
             notices {{ edges {{ node {{ payload }} }} }} \
             reports {{ edges {{ node {{ payload }} }} }} }} }}"
        );
        let data: InputData = parse_data(self.execute(query).await?)?;
        let input = data.input.ok_or(QueryError::NotFound)?;

        let notices = match input.notices {
            Some(connection) => connection_payloads(connection)?,
            None => Vec::new(),
        };
        let reports = match input.reports {
            Some(connection) => connection_payloads(connection)?,
            None => Vec::new(),
        };
        Ok(InputResults { notices, reports })
    }
}

fn parse_data<T: serde::de::DeserializeOwned>(
    data: serde_json::Value,
) -> Result<T, QueryError> {
    serde_json::from_value(data).map_err(|err| {
        QueryError::Transport(anyhow!("unexpected GraphQL response shape: {err}"))
    })
}

fn connection_payloads(connection: Connection) -> Result<Vec<Vec<u8>>, QueryError> {
    connection
        .edges
        .into_iter()
        .map(|edge| decode_payload(&edge.node.payload))
        .collect()
}

fn first_payload(connection: Connection) -> Result<Vec<u8>, QueryError> {
    let edge = connection.edges.into_iter().next().ok_or(QueryError::NotFound)?;
    decode_payload(&edge.node.payload)
}

fn decode_payload(payload: &str) -> Result<Vec<u8>, QueryError> {
    let hexdata = payload.strip_prefix("0x").unwrap_or(payload);
    hex::decode(hexdata)
        .map_err(|err| QueryError::Transport(anyhow!("payload is not valid hex: {err}")))
}
