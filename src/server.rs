//! MCP server exposing search and path resolution as tools.

use crate::context::RequestContext;
use crate::engine::Engine;
use crate::format::{format_outcome, format_redirect, format_search_page};
use rmcp::{
    ServerHandler,
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::*,
    schemars::{self, JsonSchema, generate::SchemaSettings},
    tool, tool_handler, tool_router,
};
use serde::Deserialize;
use std::sync::Arc;

/// Parameters for the search tool.
#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SearchRequest {
    /// Free-text query, or an exact module/package/directory path
    pub query: String,
    /// 1-based page number (default: 1)
    #[serde(default)]
    pub page: Option<i64>,
    /// Results per page (default from server configuration)
    #[serde(default)]
    pub limit: Option<i64>,
    /// Skip exact-path redirects and always return search results
    #[serde(default)]
    pub no_redirect: bool,
    /// Return the page as JSON instead of text
    #[serde(default)]
    pub json: bool,
}

/// Parameters for the resolve_path tool.
#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ResolvePathRequest {
    /// Candidate module, package or directory path
    pub query: String,
}

/// Handle a search tool call.
pub async fn handle_search(
    engine: &Engine,
    ctx: &RequestContext,
    request: SearchRequest,
) -> Result<String, String> {
    let params = engine
        .params(request.page, request.limit)
        .map_err(|e| e.to_string())?;

    if request.no_redirect || request.json {
        let page = engine
            .search(ctx, &request.query, params)
            .await
            .map_err(|e| e.to_string())?;
        return if request.json {
            serde_json::to_string_pretty(&page).map_err(|e| e.to_string())
        } else {
            Ok(format_search_page(&request.query, &page))
        };
    }

    let outcome = engine
        .handle(ctx, &request.query, params)
        .await
        .map_err(|e| e.to_string())?;
    Ok(format_outcome(&request.query, &outcome))
}

/// Handle a resolve_path tool call.
pub async fn handle_resolve_path(
    engine: &Engine,
    ctx: &RequestContext,
    request: ResolvePathRequest,
) -> Result<String, String> {
    let target = engine
        .resolve(ctx, &request.query)
        .await
        .map_err(|e| e.to_string())?;
    Ok(format_redirect(&request.query, target.as_deref()))
}

/// MCP Server for corpus search and path redirects
#[derive(Clone)]
pub struct SearchServer {
    engine: Arc<Engine>,

    /// Tool router for handling MCP tool calls
    tool_router: ToolRouter<Self>,
}

impl std::fmt::Debug for SearchServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchServer")
            .field("engine", &self.engine)
            .finish()
    }
}

#[tool_router]
impl SearchServer {
    pub fn new(engine: Arc<Engine>) -> Self {
        Self {
            engine,
            tool_router: Self::tool_router(),
        }
    }

    pub fn engine(&self) -> &Arc<Engine> {
        &self.engine
    }

    #[tool(
        description = "Search packages by free text. A query that is an exact module, package or directory path returns a redirect target instead of results. Results are paginated; counts for large result sets are approximate.",
        input_schema = inline_schema_for_type::<SearchRequest>()
    )]
    async fn search(
        &self,
        Parameters(request): Parameters<SearchRequest>,
    ) -> std::result::Result<String, String> {
        let ctx = self.engine.request_context();
        handle_search(&self.engine, &ctx, request).await
    }

    #[tool(
        description = "Check whether a string is an exact module, package or directory path in the corpus and return its canonical page path.",
        input_schema = inline_schema_for_type::<ResolvePathRequest>()
    )]
    async fn resolve_path(
        &self,
        Parameters(request): Parameters<ResolvePathRequest>,
    ) -> std::result::Result<String, String> {
        let ctx = self.engine.request_context();
        handle_resolve_path(&self.engine, &ctx, request).await
    }
}

#[tool_handler]
impl ServerHandler for SearchServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo::new(ServerCapabilities::builder().enable_tools().build())
            .with_protocol_version(ProtocolVersion::V_2024_11_05)
            .with_server_info(Implementation::from_build_env())
            .with_instructions(
                "modsearch: search a corpus of versioned modules and their packages. \
                 Use search for free-text queries; exact paths resolve to redirects. \
                 Use resolve_path to check a path without searching.",
            )
    }
}

/// Generate an inline JSON schema for MCP tools
///
/// Unlike rmcp's default `schema_for_type()`, this function sets `inline_subschemas = true`
/// to generate inline definitions instead of $ref patterns.
pub fn inline_schema_for_type<T: JsonSchema>() -> Arc<JsonObject> {
    let mut settings = SchemaSettings::draft07();
    settings.transforms = vec![Box::new(schemars::transform::AddNullable::default())];
    settings.inline_subschemas = true;

    let generator = settings.into_generator();
    let schema = generator.into_root_schema_for::<T>();
    let object = serde_json::to_value(schema).expect("failed to serialize schema");

    let json_object = match object {
        serde_json::Value::Object(object) => object,
        _ => panic!("Schema serialization produced non-object value"),
    };

    Arc::new(json_object)
}
