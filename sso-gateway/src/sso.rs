//! HTTP bindings of the `sso.Sso` service.
//!
//! | Method | Path | Request | Response |
//! |---|---|---|---|
//! | GET | `/ping` | none | `text` field |
//! | GET | `/metrics` | none | `text` field |
//! | GET | `/v1/audit` | query string | `AuditListReply` |
//! | POST | `/v1/audit` | body | `AuditReadReply` |
//! | GET | `/v1/audit/{id}` | path `id` | `AuditReadReply` |
//! | PATCH | `/v1/audit/{id}` | body, path `id` | `AuditReadReply` |

use sso_gateway_core::pb::Text;
use sso_gateway_core::{AuditCreate, AuditList, AuditRead, AuditUpdate, Metrics, Ping};

use crate::error::RegisterError;
use crate::route::{Route, path_value};
use crate::table::RouteTable;

/// Register every `sso.Sso` route on `table`.
pub fn register_sso_routes(table: &mut RouteTable) -> Result<(), RegisterError> {
    table
        .add(Route::<Ping>::get("/ping").response_field("text", text_body))?
        .add(Route::<Metrics>::get("/metrics").response_field("text", text_body))?
        .add(Route::<AuditList>::get("/v1/audit").query())?
        .add(Route::<AuditCreate>::post("/v1/audit").body())?
        .add(Route::<AuditRead>::get("/v1/audit/{id}").path("id", |req, value| {
            req.id = path_value("id", value)?;
            Ok(())
        }))?
        .add(
            Route::<AuditUpdate>::patch("/v1/audit/{id}")
                .body()
                .path("id", |req, value| {
                    req.id = path_value("id", value)?;
                    Ok(())
                }),
        )?;
    Ok(())
}

fn text_body(reply: &Text) -> Result<Vec<u8>, serde_json::Error> {
    serde_json::to_vec(&reply.text)
}
