//! Table service client and its [`SponsorStore`] implementation.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use pipeline::{PersistenceTarget, SinkError, SponsorGuid, SponsorLogin, SponsorStore, TableName};
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::{StatusCode, Url};
use serde::Serialize;
use tracing::{debug, instrument};

use crate::auth;
use crate::{Credentials, StorageAccount, TableStorageError};

/// Table service REST API version sent with every request.
pub const API_VERSION: &str = "2019-02-02";

/// Partition shared by every sponsor record.
pub const SPONSOR_PARTITION_KEY: &str = "Sponsor";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Serialize)]
struct CreateTableRequest<'a> {
    #[serde(rename = "TableName")]
    table_name: &'a str,
}

/// One sponsor row: partition `Sponsor`, row key = the sponsor GUID.
#[derive(Debug, Serialize)]
struct SponsorEntity<'a> {
    #[serde(rename = "PartitionKey")]
    partition_key: &'a str,
    #[serde(rename = "RowKey")]
    row_key: String,
    github_login: &'a str,
    payload: &'a str,
}

/// Writes sponsor records to an Azure Table Storage table.
#[derive(Debug, Clone)]
pub struct TableStorageClient {
    http: reqwest::Client,
    account: StorageAccount,
    table: TableName,
}

impl TableStorageClient {
    /// Creates a client for `table` in `account`.
    pub fn new(account: StorageAccount, table: TableName) -> Result<Self, TableStorageError> {
        let http = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            http,
            account,
            table,
        })
    }

    /// Creates a client from the configured persistence target.
    pub fn from_target(target: &PersistenceTarget) -> Result<Self, TableStorageError> {
        let account = StorageAccount::parse(target.connection_string.expose())?;
        Self::new(account, target.table.clone())
    }

    /// Creates the table, treating "already exists" as success.
    #[instrument(skip(self), fields(table = %self.table))]
    pub async fn create_table_if_not_exists(&self) -> Result<(), TableStorageError> {
        let url = self.resource_url("Tables")?;
        let body = CreateTableRequest {
            table_name: self.table.as_str(),
        };

        let response = self.post(url, &body).await?;
        match response.status() {
            status if status.is_success() => {
                debug!("Table created");
                Ok(())
            }
            StatusCode::CONFLICT => {
                debug!("Table already exists");
                Ok(())
            }
            _ => Err(rejected("create table", response).await),
        }
    }

    /// Inserts one sponsor record.
    #[instrument(skip(self, payload), fields(table = %self.table, sponsor_guid = %guid))]
    pub async fn insert_sponsor(
        &self,
        guid: &SponsorGuid,
        login: &SponsorLogin,
        payload: &str,
    ) -> Result<(), TableStorageError> {
        let url = self.resource_url(self.table.as_str())?;
        let entity = SponsorEntity {
            partition_key: SPONSOR_PARTITION_KEY,
            row_key: guid.to_string(),
            github_login: login.as_str(),
            payload,
        };

        let response = self.post(url, &entity).await?;
        if response.status().is_success() {
            debug!("Sponsor entity inserted");
            Ok(())
        } else {
            Err(rejected("insert entity", response).await)
        }
    }

    // Appends `resource` to the endpoint path and, for SAS credentials, the token.
    fn resource_url(&self, resource: &str) -> Result<Url, TableStorageError> {
        let endpoint = self.account.table_endpoint();
        let mut url = endpoint.clone();
        url.path_segments_mut()
            .map_err(|()| TableStorageError::InvalidEndpoint(endpoint.to_string()))?
            .pop_if_empty()
            .push(resource);

        if let Credentials::SharedAccessSignature(token) = self.account.credentials() {
            url.set_query(Some(token));
        }
        Ok(url)
    }

    async fn post<T: Serialize + ?Sized>(
        &self,
        url: Url,
        body: &T,
    ) -> Result<reqwest::Response, TableStorageError> {
        let date = auth::ms_date(Utc::now());

        let mut request = self
            .http
            .post(url.clone())
            .header("x-ms-date", &date)
            .header("x-ms-version", API_VERSION)
            .header("DataServiceVersion", "3.0;NetFx")
            .header(ACCEPT, "application/json;odata=nometadata")
            .header("Prefer", "return-no-content")
            .json(body);

        if let Credentials::SharedKey { account_name, key } = self.account.credentials() {
            request = request.header(
                AUTHORIZATION,
                auth::shared_key_lite(account_name, key, &date, &url),
            );
        }

        Ok(request.send().await?)
    }
}

async fn rejected(operation: &'static str, response: reqwest::Response) -> TableStorageError {
    let status = response.status().as_u16();
    let message = response.text().await.unwrap_or_default();
    TableStorageError::Status {
        operation,
        status,
        message,
    }
}

#[async_trait]
impl SponsorStore for TableStorageClient {
    async fn save_sponsor(
        &self,
        guid: &SponsorGuid,
        login: &SponsorLogin,
        payload: &str,
    ) -> Result<(), SinkError> {
        self.create_table_if_not_exists().await?;
        self.insert_sponsor(guid, login, payload).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;
    use std::sync::{Arc, Mutex};

    use axum::body::Bytes;
    use axum::extract::State;
    use axum::http::{HeaderMap, Uri};
    use axum::Router;

    use super::*;

    const DEV_KEY: &str =
        "Eby8vdM02xNOcqFlqUwJPLlmEtlCDXJ1OUzFT50uSRZ6IFsuFq2UVErCz4I6tq/K1SZFPTOtr/KBHBeksoGMGw==";

    #[derive(Debug, Clone)]
    struct Seen {
        path: String,
        query: Option<String>,
        headers: HeaderMap,
        body: serde_json::Value,
    }

    #[derive(Clone)]
    struct Stub {
        create_status: StatusCode,
        insert_status: StatusCode,
        seen: Arc<Mutex<Vec<Seen>>>,
    }

    impl Stub {
        fn new(create_status: StatusCode, insert_status: StatusCode) -> Self {
            Self {
                create_status,
                insert_status,
                seen: Arc::default(),
            }
        }

        fn seen(&self) -> Vec<Seen> {
            self.seen.lock().unwrap().clone()
        }
    }

    async fn record(
        State(stub): State<Stub>,
        uri: Uri,
        headers: HeaderMap,
        body: Bytes,
    ) -> (StatusCode, String) {
        let path = uri.path().to_string();
        let status = if path.ends_with("/Tables") {
            stub.create_status
        } else {
            stub.insert_status
        };
        stub.seen.lock().unwrap().push(Seen {
            path,
            query: uri.query().map(str::to_string),
            headers,
            body: serde_json::from_slice(&body).unwrap_or_default(),
        });

        let body = if status.is_success() {
            String::new()
        } else {
            r#"{"odata.error":{"code":"AuthorizationFailure"}}"#.to_string()
        };
        (status, body)
    }

    async fn spawn(stub: Stub) -> SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = Router::new().fallback(record).with_state(stub);
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        addr
    }

    fn client(connection_string: &str) -> TableStorageClient {
        TableStorageClient::new(
            StorageAccount::parse(connection_string).unwrap(),
            TableName::new("Sponsors").unwrap(),
        )
        .unwrap()
    }

    fn shared_key_client(addr: SocketAddr) -> TableStorageClient {
        client(&format!(
            "AccountName=devstoreaccount1;AccountKey={DEV_KEY};TableEndpoint=http://{addr}/devstoreaccount1"
        ))
    }

    fn login() -> SponsorLogin {
        SponsorLogin::new("octocat").unwrap()
    }

    #[tokio::test]
    async fn save_creates_table_then_inserts_entity() {
        let stub = Stub::new(StatusCode::CREATED, StatusCode::NO_CONTENT);
        let addr = spawn(stub.clone()).await;
        let guid = SponsorGuid::new_random();
        let payload = r#"{"sponsorship":{"sponsor":{"login":"octocat"}}}"#;

        shared_key_client(addr)
            .save_sponsor(&guid, &login(), payload)
            .await
            .unwrap();

        let seen = stub.seen();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].path, "/devstoreaccount1/Tables");
        assert_eq!(seen[0].body, serde_json::json!({ "TableName": "Sponsors" }));
        assert_eq!(seen[1].path, "/devstoreaccount1/Sponsors");
        assert_eq!(
            seen[1].body,
            serde_json::json!({
                "PartitionKey": "Sponsor",
                "RowKey": guid.to_string(),
                "github_login": "octocat",
                "payload": payload,
            })
        );
    }

    #[tokio::test]
    async fn requests_carry_shared_key_lite_authorization() {
        let stub = Stub::new(StatusCode::NO_CONTENT, StatusCode::NO_CONTENT);
        let addr = spawn(stub.clone()).await;

        shared_key_client(addr)
            .create_table_if_not_exists()
            .await
            .unwrap();

        let headers = &stub.seen()[0].headers;
        let authorization = headers["authorization"].to_str().unwrap();
        assert!(authorization.starts_with("SharedKeyLite devstoreaccount1:"));
        assert_eq!(headers["x-ms-version"], API_VERSION);
        assert!(headers["x-ms-date"].to_str().unwrap().ends_with(" GMT"));
        assert_eq!(headers["content-type"], "application/json");
    }

    #[tokio::test]
    async fn existing_table_is_not_an_error() {
        let stub = Stub::new(StatusCode::CONFLICT, StatusCode::NO_CONTENT);
        let addr = spawn(stub.clone()).await;

        let result = shared_key_client(addr)
            .save_sponsor(&SponsorGuid::new_random(), &login(), "{}")
            .await;

        assert!(result.is_ok());
        assert_eq!(stub.seen().len(), 2);
    }

    #[tokio::test]
    async fn rejected_insert_becomes_a_persistence_sink_error() {
        let stub = Stub::new(StatusCode::NO_CONTENT, StatusCode::FORBIDDEN);
        let addr = spawn(stub).await;

        let err = shared_key_client(addr)
            .save_sponsor(&SponsorGuid::new_random(), &login(), "{}")
            .await
            .unwrap_err();

        match err {
            SinkError::Rejected {
                sink,
                status,
                message,
            } => {
                assert_eq!(sink, pipeline::SinkKind::Persistence);
                assert_eq!(status, 403);
                assert!(message.contains("AuthorizationFailure"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn sas_credentials_go_in_the_query_string() {
        let stub = Stub::new(StatusCode::NO_CONTENT, StatusCode::NO_CONTENT);
        let addr = spawn(stub.clone()).await;
        let sut = client(&format!(
            "TableEndpoint=http://{addr}/;SharedAccessSignature=sv=2019-02-02&sig=abc"
        ));

        sut.save_sponsor(&SponsorGuid::new_random(), &login(), "{}")
            .await
            .unwrap();

        let seen = stub.seen();
        assert_eq!(seen[1].path, "/Sponsors");
        assert_eq!(seen[1].query.as_deref(), Some("sv=2019-02-02&sig=abc"));
        assert!(!seen[1].headers.contains_key("authorization"));
    }

    #[tokio::test]
    async fn unreachable_service_is_unavailable() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = shared_key_client(addr)
            .save_sponsor(&SponsorGuid::new_random(), &login(), "{}")
            .await
            .unwrap_err();

        assert!(matches!(err, SinkError::Unavailable { .. }));
    }
}
