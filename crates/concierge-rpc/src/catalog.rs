use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Method;
use serde_json::Value;

use concierge_core::{Config, Error, ToolResult};

use crate::registry::{ToolDefinition, ToolHandler, ToolRegistry};

/// One row of the booking API catalog: tool name, HTTP verb, fixed route
/// and the argument schema advertised through `tools/list`.
struct EndpointSpec {
    name: &'static str,
    description: &'static str,
    method: Method,
    route: &'static str,
    input_schema: Value,
}

impl EndpointSpec {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name.to_string(),
            description: self.description.to_string(),
            input_schema: self.input_schema.clone(),
            output_schema: api_response_schema(),
        }
    }
}

/// Build the full tool registry for one request.
///
/// Pure factory: the registry never outlives the request that built it, so
/// concurrent requests share nothing mutable.
///
/// # Errors
/// Returns `Error::InvalidParams` if a catalog entry carries an empty name;
/// the RPC layer maps that to an internal error.
pub fn build_registry(config: &Config, client: &reqwest::Client) -> Result<ToolRegistry, Error> {
    let mut registry = ToolRegistry::new();

    registry.register(ping_definition(), Arc::new(PingTool))?;

    let base = config.booking_api_base.trim_end_matches('/');
    for spec in endpoints() {
        let handler = ProxyTool {
            name: spec.name,
            method: spec.method.clone(),
            url: format!("{base}{}", spec.route),
            token: config.booking_api_token.clone(),
            client: client.clone(),
        };
        registry.register(spec.definition(), Arc::new(handler))?;
    }

    Ok(registry)
}

/// Local liveness tool, no upstream call.
struct PingTool;

#[async_trait]
impl ToolHandler for PingTool {
    async fn call(&self, _arguments: Value) -> Result<ToolResult, Error> {
        Ok(ToolResult::json(
            serde_json::json!({"ok": true, "message": "pong"}),
        ))
    }
}

/// Generic forwarder: one instance per catalog row, parameterized by verb
/// and route. Catches every failure and reports it as an `isError` result
/// so a broken upstream never corrupts the RPC envelope.
struct ProxyTool {
    name: &'static str,
    method: Method,
    url: String,
    token: Option<String>,
    client: reqwest::Client,
}

#[async_trait]
impl ToolHandler for ProxyTool {
    async fn call(&self, arguments: Value) -> Result<ToolResult, Error> {
        match self.forward(&arguments).await {
            Ok(result) => Ok(result),
            Err(e) => {
                tracing::warn!("tool '{}' upstream call failed: {e}", self.name);
                Ok(ToolResult::error(e.to_string()))
            }
        }
    }
}

impl ProxyTool {
    async fn forward(&self, arguments: &Value) -> Result<ToolResult, Error> {
        let mut request = self.client.request(self.method.clone(), &self.url);

        if let Some(query) = arguments.get("query").and_then(Value::as_object) {
            let pairs: Vec<(String, String)> = query
                .iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| (k.clone(), query_value(v)))
                .collect();
            request = request.query(&pairs);
        }

        if let Some(body) = arguments.get("body") {
            if !body.is_null() {
                request = request.json(body);
            }
        }

        if let Some(headers) = arguments.get("headers").and_then(Value::as_object) {
            for (key, value) in headers {
                if let Some(value) = value.as_str() {
                    request = request.header(key.as_str(), value);
                }
            }
        }

        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::Upstream(format!("{}: {e}", self.name)))?;

        let status = response.status();
        let is_json = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.contains("json"));
        let text = response
            .text()
            .await
            .map_err(|e| Error::Upstream(format!("{}: {e}", self.name)))?;

        if !status.is_success() {
            return Err(Error::Upstream(format!(
                "{} returned HTTP {status}: {text}",
                self.name
            )));
        }

        if is_json {
            let value: Value = serde_json::from_str(&text)
                .map_err(|e| Error::Upstream(format!("{}: invalid JSON response: {e}", self.name)))?;
            Ok(ToolResult::json(value))
        } else {
            Ok(ToolResult::text(text))
        }
    }
}

/// Render a JSON value as a query-string parameter.
fn query_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn ping_definition() -> ToolDefinition {
    ToolDefinition {
        name: "ping".to_string(),
        description: "Liveness check. Returns {ok: true, message: \"pong\"} without calling the booking API.".to_string(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {},
            "required": []
        }),
        output_schema: serde_json::json!({
            "type": "object",
            "properties": {
                "ok": {"type": "boolean"},
                "message": {"type": "string"}
            },
            "required": ["ok", "message"]
        }),
    }
}

fn locale_schema() -> Value {
    serde_json::json!({
        "type": "string",
        "enum": ["de_DE", "en_DE"],
        "description": "Locale for the response"
    })
}

fn room_configurations_schema() -> Value {
    serde_json::json!({
        "type": "array",
        "description": "One entry per room",
        "items": {
            "type": "object",
            "properties": {
                "adults": {"type": "integer", "description": "Number of adults"},
                "childrenAges": {
                    "type": "array",
                    "items": {"type": "integer"},
                    "description": "Age of each child"
                }
            },
            "required": ["adults"]
        }
    })
}

fn headers_schema() -> Value {
    serde_json::json!({
        "type": "object",
        "additionalProperties": {"type": "string"},
        "description": "Extra HTTP headers forwarded to the booking API"
    })
}

/// Wrap per-tool properties into the canonical `{query}` argument shape.
fn query_input(properties: Value, required: &[&str]) -> Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "query": {
                "type": "object",
                "properties": properties,
                "required": required
            },
            "headers": headers_schema()
        },
        "required": ["query"]
    })
}

/// Wrap per-tool properties into the canonical `{body}` argument shape.
fn body_input(properties: Value, required: &[&str]) -> Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "body": {
                "type": "object",
                "properties": properties,
                "required": required
            },
            "headers": headers_schema()
        },
        "required": ["body"]
    })
}

fn api_response_schema() -> Value {
    serde_json::json!({
        "type": "object",
        "description": "Raw booking API response",
        "additionalProperties": true
    })
}

/// The fixed booking API catalog. Listing order here is listing order in
/// `tools/list`.
fn endpoints() -> Vec<EndpointSpec> {
    vec![
        EndpointSpec {
            name: "booking_search",
            description: "Look up an existing booking by reference number and email.",
            method: Method::GET,
            route: "/booking/search",
            input_schema: query_input(
                serde_json::json!({
                    "bookingReferenceNumber": {"type": "string", "description": "Booking reference number"},
                    "email": {"type": "string", "description": "Email the booking was made with"},
                    "locale": locale_schema()
                }),
                &["bookingReferenceNumber", "email", "locale"],
            ),
        },
        EndpointSpec {
            name: "booking_cancel",
            description: "Cancel an existing booking.",
            method: Method::POST,
            route: "/booking/cancel",
            input_schema: body_input(
                serde_json::json!({
                    "itineraryNumber": {"type": "string", "description": "Itinerary number"},
                    "bookingNumber": {"type": "string", "description": "Booking number"},
                    "email": {"type": "string", "description": "Email the booking was made with"},
                    "locale": locale_schema()
                }),
                &["itineraryNumber", "bookingNumber", "email", "locale"],
            ),
        },
        EndpointSpec {
            name: "find_hotels",
            description: "Search hotels for a destination and travel period.",
            method: Method::POST,
            route: "/find-hotels",
            input_schema: body_input(
                serde_json::json!({
                    "destination": {
                        "type": "object",
                        "properties": {
                            "id": {"type": "string", "description": "Destination identifier"},
                            "type": {"type": "string", "description": "Destination kind, e.g. city or region"}
                        },
                        "required": ["id", "type"]
                    },
                    "departureDate": {"type": "string", "description": "Departure date (YYYY-MM-DD)"},
                    "returnDate": {"type": "string", "description": "Return date (YYYY-MM-DD)"},
                    "currency": {"type": "string", "description": "Currency code, e.g. EUR"},
                    "roomConfigurations": room_configurations_schema(),
                    "locale": locale_schema()
                }),
                &[
                    "destination",
                    "departureDate",
                    "returnDate",
                    "currency",
                    "roomConfigurations",
                    "locale",
                ],
            ),
        },
        EndpointSpec {
            name: "currencies_list",
            description: "List the currencies supported by the booking API.",
            method: Method::GET,
            route: "/currencies",
            input_schema: query_input(
                serde_json::json!({"locale": locale_schema()}),
                &["locale"],
            ),
        },
        EndpointSpec {
            name: "hotels_list",
            description: "List known hotels, paged.",
            method: Method::GET,
            route: "/hotels",
            input_schema: query_input(
                serde_json::json!({
                    "locale": locale_schema(),
                    "page": {"type": "integer", "description": "Page number, starting at 1"}
                }),
                &["locale"],
            ),
        },
        EndpointSpec {
            name: "hotel_offers",
            description: "Get offers for a specific hotel and travel period.",
            method: Method::POST,
            route: "/hotel/offer",
            input_schema: body_input(
                serde_json::json!({
                    "hotelId": {"type": "string", "description": "Hotel identifier"},
                    "departureDate": {"type": "string", "description": "Departure date (YYYY-MM-DD)"},
                    "returnDate": {"type": "string", "description": "Return date (YYYY-MM-DD)"},
                    "currency": {"type": "string", "description": "Currency code, e.g. EUR"},
                    "roomConfigurations": room_configurations_schema(),
                    "locale": locale_schema()
                }),
                &[
                    "hotelId",
                    "departureDate",
                    "returnDate",
                    "currency",
                    "roomConfigurations",
                    "locale",
                ],
            ),
        },
        EndpointSpec {
            name: "hotel_reference",
            description: "Fetch the hotel reference data set.",
            method: Method::GET,
            route: "/hotel-reference",
            input_schema: query_input(
                serde_json::json!({"locale": locale_schema()}),
                &["locale"],
            ),
        },
        EndpointSpec {
            name: "crapi_hotel_contact",
            description: "Fetch hotel contact details from the legacy API.",
            method: Method::GET,
            route: "/crapi/hotel/contact",
            input_schema: query_input(
                serde_json::json!({"locale": locale_schema()}),
                &["locale"],
            ),
        },
        EndpointSpec {
            name: "package_offer",
            description: "Get a package offer (hotel plus transport) for a hotel and travel period.",
            method: Method::POST,
            route: "/offer/package",
            input_schema: body_input(
                serde_json::json!({
                    "hotelId": {"type": "string", "description": "Hotel identifier"},
                    "departureDate": {"type": "string", "description": "Departure date (YYYY-MM-DD)"},
                    "returnDate": {"type": "string", "description": "Return date (YYYY-MM-DD)"},
                    "currency": {"type": "string", "description": "Currency code, e.g. EUR"},
                    "roomConfigurations": room_configurations_schema(),
                    "locale": locale_schema()
                }),
                &[
                    "hotelId",
                    "departureDate",
                    "returnDate",
                    "currency",
                    "roomConfigurations",
                    "locale",
                ],
            ),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jsonrpc::JsonRpcRequest;
    use std::time::Duration;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(base: &str, token: Option<&str>) -> Config {
        Config {
            booking_api_base: base.to_string(),
            booking_api_token: token.map(str::to_string),
            request_timeout: Duration::from_secs(5),
            llm_api_base: String::new(),
            llm_api_key: None,
            llm_model: String::new(),
            router_url: String::new(),
            host: "127.0.0.1".to_string(),
            port: 0,
        }
    }

    fn call(name: &str, arguments: Value) -> JsonRpcRequest {
        JsonRpcRequest {
            jsonrpc: "2.0".to_string(),
            id: serde_json::json!(1),
            method: "tools/call".to_string(),
            params: Some(serde_json::json!({"name": name, "arguments": arguments})),
        }
    }

    #[test]
    fn all_tools_defined() {
        let registry =
            build_registry(&config("http://localhost:9", None), &reqwest::Client::new()).unwrap();
        let names: Vec<&str> = registry
            .definitions()
            .iter()
            .map(|d| d.name.as_str())
            .collect();

        assert_eq!(
            names,
            [
                "ping",
                "booking_search",
                "booking_cancel",
                "find_hotels",
                "currencies_list",
                "hotels_list",
                "hotel_offers",
                "hotel_reference",
                "crapi_hotel_contact",
                "package_offer",
            ]
        );
    }

    #[test]
    fn every_definition_has_schemas() {
        let registry =
            build_registry(&config("http://localhost:9", None), &reqwest::Client::new()).unwrap();
        for def in registry.definitions() {
            assert!(!def.description.is_empty(), "{} lacks description", def.name);
            assert_eq!(def.input_schema["type"], "object");
            assert!(def.input_schema["properties"].is_object());
            assert_eq!(def.output_schema["type"], "object");
        }
    }

    #[test]
    fn booking_search_requires_reference_email_and_locale() {
        let spec = endpoints()
            .into_iter()
            .find(|e| e.name == "booking_search")
            .unwrap();
        let required: Vec<&str> = spec.input_schema["properties"]["query"]["required"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(Value::as_str)
            .collect();
        assert_eq!(required, ["bookingReferenceNumber", "email", "locale"]);
    }

    #[test]
    fn locale_is_an_enum_everywhere() {
        for spec in endpoints() {
            let props = spec.input_schema["properties"].as_object().unwrap();
            let container = props.get("query").or_else(|| props.get("body")).unwrap();
            let locale = &container["properties"]["locale"];
            assert_eq!(
                locale["enum"],
                serde_json::json!(["de_DE", "en_DE"]),
                "{} locale enum",
                spec.name
            );
        }
    }

    #[tokio::test]
    async fn ping_is_local_and_idempotent() {
        let registry =
            build_registry(&config("http://localhost:9", None), &reqwest::Client::new()).unwrap();
        for _ in 0..3 {
            let resp = registry.dispatch(&call("ping", serde_json::json!({}))).await;
            let result = resp.result.unwrap();
            assert_eq!(result["structuredContent"]["ok"], true);
            assert_eq!(result["structuredContent"]["message"], "pong");
        }
    }

    #[tokio::test]
    async fn proxy_forwards_query_and_bearer_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/currencies"))
            .and(query_param("locale", "en_DE"))
            .and(header("authorization", "Bearer secret-token"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"currencies": ["EUR", "USD"]})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let registry = build_registry(
            &config(&server.uri(), Some("secret-token")),
            &reqwest::Client::new(),
        )
        .unwrap();
        let resp = registry
            .dispatch(&call(
                "currencies_list",
                serde_json::json!({"query": {"locale": "en_DE"}}),
            ))
            .await;

        let result = resp.result.unwrap();
        assert!(result.get("isError").is_none());
        assert_eq!(result["structuredContent"]["currencies"][0], "EUR");
    }

    #[tokio::test]
    async fn proxy_posts_json_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/booking/cancel"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"cancelled": true})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let registry =
            build_registry(&config(&server.uri(), None), &reqwest::Client::new()).unwrap();
        let resp = registry
            .dispatch(&call(
                "booking_cancel",
                serde_json::json!({"body": {
                    "itineraryNumber": "IT-1",
                    "bookingNumber": "BK-1",
                    "email": "guest@example.com",
                    "locale": "de_DE"
                }}),
            ))
            .await;

        let received = &server.received_requests().await.unwrap()[0];
        let body: Value = serde_json::from_slice(&received.body).unwrap();
        assert_eq!(body["bookingNumber"], "BK-1");
        assert_eq!(
            resp.result.unwrap()["structuredContent"]["cancelled"],
            true
        );
    }

    #[tokio::test]
    async fn proxy_forwards_caller_headers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/hotels"))
            .and(header("x-request-id", "req-7"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"hotels": []})))
            .expect(1)
            .mount(&server)
            .await;

        let registry =
            build_registry(&config(&server.uri(), None), &reqwest::Client::new()).unwrap();
        let resp = registry
            .dispatch(&call(
                "hotels_list",
                serde_json::json!({
                    "query": {"locale": "en_DE"},
                    "headers": {"x-request-id": "req-7"}
                }),
            ))
            .await;
        assert!(resp.error.is_none());
    }

    #[tokio::test]
    async fn upstream_error_status_becomes_error_result() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/currencies"))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance window"))
            .mount(&server)
            .await;

        let registry =
            build_registry(&config(&server.uri(), None), &reqwest::Client::new()).unwrap();
        let resp = registry
            .dispatch(&call(
                "currencies_list",
                serde_json::json!({"query": {"locale": "en_DE"}}),
            ))
            .await;

        // Upstream failure stays inside the result payload, not the envelope.
        assert!(resp.error.is_none());
        let result = resp.result.unwrap();
        assert_eq!(result["isError"], true);
        let text = result["content"][0]["text"].as_str().unwrap();
        assert!(text.contains("503"));
        assert!(text.contains("maintenance window"));
    }

    #[tokio::test]
    async fn unreachable_upstream_becomes_error_result() {
        let registry =
            build_registry(&config("http://127.0.0.1:9", None), &reqwest::Client::new()).unwrap();
        let resp = registry
            .dispatch(&call(
                "hotel_reference",
                serde_json::json!({"query": {"locale": "en_DE"}}),
            ))
            .await;

        assert!(resp.error.is_none());
        assert_eq!(resp.result.unwrap()["isError"], true);
    }

    #[tokio::test]
    async fn non_json_response_returns_raw_text() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/hotel-reference"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("plain text reference")
                    .insert_header("content-type", "text/plain"),
            )
            .mount(&server)
            .await;

        let registry =
            build_registry(&config(&server.uri(), None), &reqwest::Client::new()).unwrap();
        let resp = registry
            .dispatch(&call(
                "hotel_reference",
                serde_json::json!({"query": {"locale": "en_DE"}}),
            ))
            .await;

        let result = resp.result.unwrap();
        assert!(result.get("structuredContent").is_none());
        assert_eq!(result["content"][0]["text"], "plain text reference");
    }
}
