//! REST binding for the registry service.

use secrecy::ExposeSecret;
use validator::Validate;

use regsync_core::{RegistryId, RegistrySpec, ResourceId, SchemaId, SchemaSpec, SchemaType};

use crate::{ApiError, RegistryApi, Result};

pub struct HttpRegistryClient {
    client: reqwest::Client,
    base_url: url::Url,
    token: Option<secrecy::SecretString>,
}

#[derive(serde::Serialize)]
struct CreateRegistryRequest<'a> {
    description: &'a str,
}

#[derive(serde::Deserialize)]
struct DescribeRegistryResponse {
    description: String,
}

#[derive(serde::Serialize)]
struct CreateSchemaRequest<'a> {
    content: &'a str,
    description: &'a str,
    schema_type: SchemaType,
}

#[derive(serde::Deserialize)]
struct DescribeSchemaResponse {
    content: String,
    description: String,
    schema_type: SchemaType,
}

#[derive(serde::Deserialize)]
struct ErrorBody {
    code: Option<String>,
    message: Option<String>,
}

fn registry_path(id: &RegistryId) -> String {
    format!("v1/registries/name/{}", id.as_str())
}

fn schema_path(id: &SchemaId) -> String {
    format!("{}/schemas/name/{}", registry_path(&id.registry), id.name)
}

fn schema_version_path(id: &SchemaId) -> String {
    format!("{}/versions/{}", schema_path(id), id.version)
}

impl HttpRegistryClient {
    pub fn new(
        base_url: &str,
        token: Option<secrecy::SecretString>,
    ) -> Result<Self> {
        let base_url = url::Url::parse(base_url)?;
        let client = reqwest::Client::new();

        Ok(Self {
            client,
            base_url,
            token,
        })
    }

    pub fn url(
        &self,
        path: &str,
    ) -> url::Url {
        self.base_url.join(path).unwrap()
    }

    fn json_request(
        &self,
        method: reqwest::Method,
        path: &str,
        body: &impl serde::Serialize,
    ) -> Result<reqwest::Request> {
        let mut request = reqwest::Request::new(method, self.url(path));

        *request.body_mut() = Some(reqwest::Body::from(serde_json::to_vec(body)?));

        request.headers_mut().insert(
            reqwest::header::CONTENT_TYPE,
            "application/json".parse().unwrap(),
        );

        Ok(request)
    }

    async fn perform<T: serde::de::DeserializeOwned>(
        &self,
        req: reqwest::Request,
        id: &ResourceId,
    ) -> Result<T> {
        let resp = self.client.execute(req).await?;

        let status = resp.status();
        let body = resp.bytes().await?;

        if status.is_success() {
            Ok(serde_json::from_slice(&body)?)
        } else {
            Err(Self::status_error(status, body, id))
        }
    }

    async fn perform_unit(
        &self,
        req: reqwest::Request,
        id: &ResourceId,
    ) -> Result<()> {
        let resp = self.client.execute(req).await?;

        let status = resp.status();
        let body = resp.bytes().await?;

        if status.is_success() {
            Ok(())
        } else {
            Err(Self::status_error(status, body, id))
        }
    }

    async fn perform_authenticated_unit(
        &self,
        req: reqwest::Request,
        id: &ResourceId,
    ) -> Result<()> {
        let Some(token) = &self.token else {
            return Err(ApiError::NoAuth);
        };

        let mut req = req;

        req.headers_mut().insert(
            reqwest::header::AUTHORIZATION,
            format!("Bearer {}", token.expose_secret())
                .parse()
                .unwrap(),
        );

        self.perform_unit(req, id).await
    }

    fn status_error(
        status: reqwest::StatusCode,
        body: bytes::Bytes,
        id: &ResourceId,
    ) -> ApiError {
        if status == reqwest::StatusCode::NOT_FOUND {
            return ApiError::NotFound { id: id.clone() };
        }

        let message = if body.is_empty() {
            "empty response body".to_string()
        } else {
            match serde_json::from_slice::<ErrorBody>(&body) {
                Ok(parsed) => {
                    if let Some(code) = &parsed.code {
                        tracing::trace!("registry service error code: {}", code);
                    }
                    parsed
                        .message
                        .unwrap_or_else(|| String::from_utf8_lossy(&body).into_owned())
                },
                Err(parse_err) => {
                    tracing::trace! {
                        "failed to parse error response: {}",
                        parse_err,
                    }
                    String::from_utf8_lossy(&body).into_owned()
                },
            }
        };

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
            ApiError::Transient { message }
        } else {
            ApiError::Rejected {
                status: status.as_u16(),
                message,
            }
        }
    }
}

impl RegistryApi for HttpRegistryClient {
    async fn describe_registry(
        &self,
        id: &RegistryId,
    ) -> Result<RegistrySpec> {
        let request = reqwest::Request::new(reqwest::Method::GET, self.url(&registry_path(id)));

        let resp: DescribeRegistryResponse = self
            .perform(request, &ResourceId::Registry(id.clone()))
            .await?;

        Ok(RegistrySpec {
            description: resp.description,
        })
    }

    async fn create_registry(
        &self,
        id: &RegistryId,
        spec: &RegistrySpec,
    ) -> Result<()> {
        spec.validate()?;

        let request = self.json_request(
            reqwest::Method::POST,
            &registry_path(id),
            &CreateRegistryRequest {
                description: &spec.description,
            },
        )?;

        self.perform_authenticated_unit(request, &ResourceId::Registry(id.clone()))
            .await
    }

    async fn delete_registry(
        &self,
        id: &RegistryId,
    ) -> Result<()> {
        let request = reqwest::Request::new(reqwest::Method::DELETE, self.url(&registry_path(id)));

        self.perform_authenticated_unit(request, &ResourceId::Registry(id.clone()))
            .await
    }

    async fn describe_schema(
        &self,
        id: &SchemaId,
    ) -> Result<SchemaSpec> {
        let request =
            reqwest::Request::new(reqwest::Method::GET, self.url(&schema_version_path(id)));

        let resp: DescribeSchemaResponse = self
            .perform(request, &ResourceId::Schema(id.clone()))
            .await?;

        Ok(SchemaSpec {
            content: resp.content,
            description: resp.description,
            schema_type: resp.schema_type,
        })
    }

    async fn create_schema(
        &self,
        id: &SchemaId,
        spec: &SchemaSpec,
    ) -> Result<()> {
        spec.validate()?;

        let request = self.json_request(
            reqwest::Method::POST,
            &schema_path(id),
            &CreateSchemaRequest {
                content: &spec.content,
                description: &spec.description,
                schema_type: spec.schema_type,
            },
        )?;

        self.perform_authenticated_unit(request, &ResourceId::Schema(id.clone()))
            .await
    }

    async fn delete_schema(
        &self,
        id: &SchemaId,
    ) -> Result<()> {
        let request = reqwest::Request::new(reqwest::Method::DELETE, self.url(&schema_path(id)));

        self.perform_authenticated_unit(request, &ResourceId::Schema(id.clone()))
            .await
    }
}
