//! Request router / protocol mapper
//!
//! The [`Registry`] is the single entry point of the core: it parses the
//! resource path and method into an operation, authenticates when the
//! operation requires it, delegates to the lifecycle engines, and wraps
//! their outcome into the response envelope.
//!
//! ## Path grammar
//!
//! ```text
//! GET  /list-domains
//! *    /domains/<name>
//! *    /domains/<name>/availability
//! *    /domains/<name>/transfer[/<action>]    action: cancelation|approval|rejection
//! *    /entities/<handle>
//! ```
//!
//! Anything else is rejected with 400 before an engine runs.

use std::sync::Arc;

use serde_json::json;
use tracing::{debug, info};

use crate::config::RegistryConfig;
use crate::engine::auth::Authenticator;
use crate::engine::contacts::ContactEngine;
use crate::engine::domains::{Availability, DomainEngine};
use crate::engine::transfers::{TransferAction, TransferEngine, TransferRequested, TransferStatus};
use crate::error::{Error, Result};
use crate::protocol::{Method, Request, Response};
use crate::schema;
use crate::traits::registry_store::RegistryStore;

/// The registry core: engines plus protocol mapping
pub struct Registry {
    config: Arc<RegistryConfig>,
    auth: Authenticator,
    domains: DomainEngine,
    contacts: ContactEngine,
    transfers: TransferEngine,
}

impl Registry {
    /// Build a registry over an injected store
    pub fn new(store: Arc<dyn RegistryStore>, config: RegistryConfig) -> Result<Self> {
        config.validate()?;
        let config = Arc::new(config);
        Ok(Self {
            auth: Authenticator::new(Arc::clone(&store)),
            domains: DomainEngine::new(Arc::clone(&store), Arc::clone(&config)),
            contacts: ContactEngine::new(Arc::clone(&store), Arc::clone(&config)),
            transfers: TransferEngine::new(Arc::clone(&store)),
            config,
        })
    }

    /// The configuration the registry runs with
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Handle one request, producing the complete response envelope
    pub async fn handle(&self, req: Request) -> Response {
        debug!(method = %req.method, path = %req.path, "dispatching request");
        let cltrid = req.cltrid.clone();

        let response = match self.dispatch(&req).await {
            Ok(response) => response,
            Err(err) => Response::from_error(&err),
        };
        let response = response.with_cltrid(cltrid);

        info!(svtrid = %response.svtrid, status = response.status_code, "Completing transaction");
        response
    }

    async fn dispatch(&self, req: &Request) -> Result<Response> {
        if req.path == "/list-domains" {
            return self.list_domains(req).await;
        }
        if let Some(rest) = req.path.strip_prefix("/domains/") {
            return self.domain_paths(req, rest).await;
        }
        if let Some(rest) = req.path.strip_prefix("/entities/") {
            return self.contact_resource(req, rest).await;
        }
        Err(Error::BadPathPrefix)
    }

    async fn list_domains(&self, req: &Request) -> Result<Response> {
        if req.method != Method::Get {
            return Err(Error::method_for(req.method.as_str(), "for /list-domains"));
        }
        let names = self.domains.list().await?;
        Ok(Response::new(200, "OK").with_field("list", json!(names)))
    }

    async fn domain_paths(&self, req: &Request, rest: &str) -> Result<Response> {
        let parts: Vec<&str> = rest.split('/').collect();
        if parts.len() > 3 || parts.iter().any(|p| p.is_empty()) {
            return Err(Error::InvalidPath(rest.to_string()));
        }

        let name = parts[0].to_lowercase();
        if !name.ends_with(&self.config.tld_suffix()) {
            return Err(Error::NotUnderTld(self.config.tld.clone()));
        }

        match parts.get(1) {
            None => self.domain_resource(req, &name).await,
            Some(&"availability") => self.domain_availability(req, &name).await,
            Some(&"transfer") => self.domain_transfer(req, &name, parts.get(2).copied()).await,
            Some(operation) => Err(Error::UnknownOperation {
                operation: (*operation).to_string(),
                domain: name,
            }),
        }
    }

    async fn domain_resource(&self, req: &Request, name: &str) -> Result<Response> {
        match req.method {
            // A HEAD body is typically ignored by clients (RFC 9110,
            // section 6.4.1), so only the status matters here.
            Method::Head => Ok(if self.domains.exists(name).await? {
                Response::new(200, "Found")
            } else {
                Response::new(404, "Not found")
            }),
            Method::Get => {
                let record = self.domains.info(name).await?;
                Ok(Response::ok(format!("Domain {name} exists"))
                    .with_field("holder", json!(record.holder))
                    .with_field("tech_contact", json!(record.tech))
                    .with_field("admin_contact", json!(record.admin))
                    .with_field("registrar", json!(record.registrar))
                    .with_field("created", json!(record.created.to_rfc3339())))
            }
            Method::Put => {
                let registrar = self.require_auth(req, "to create a domain").await?;
                let body = require_body(req, &format!("create {name}"))?;
                let create = schema::decode_domain_create(body, name)?;
                self.domains.create(name, &create, registrar).await?;
                Ok(Response::new(201, "Created").with_result(format!("{name} created")))
            }
            Method::Patch => {
                let registrar = self
                    .require_auth(req, &format!("as the registrar of {name}"))
                    .await?;
                let body = require_body(req, &format!("patch {name}"))?;
                let patch = schema::decode_domain_patch(body, name)?;
                self.domains.patch(name, &patch, registrar).await?;
                Ok(Response::new(204, "Updated").with_result("Update done"))
            }
            Method::Delete => {
                let registrar = self
                    .require_auth(req, &format!("as the registrar of {name}"))
                    .await?;
                self.domains.delete(name, registrar).await?;
                Ok(Response::new(202, "Accepted").with_result(format!("{name} deleted")))
            }
            _ => Err(Error::method(req.method.as_str())),
        }
    }

    async fn domain_availability(&self, req: &Request, name: &str) -> Result<Response> {
        if req.method != Method::Head && req.method != Method::Get {
            return Err(Error::method(req.method.as_str()));
        }
        Ok(match self.domains.availability(name).await? {
            Availability::Registered => {
                Response::new(200, "Found").with_result(format!("Domain {name} already exists"))
            }
            Availability::Registerable => {
                let result = if req.method == Method::Head {
                    format!("Domain {name} NOT found")
                } else {
                    format!("Domain {name} NOT found. It can be registered")
                };
                Response::new(404, "Not found").with_result(result)
            }
            Availability::Unregisterable(reason) => {
                let result = if req.method == Method::Head {
                    format!("Domain {name} NOT found")
                } else {
                    format!("Domain {name} NOT found. It cannot be registered because {reason}")
                };
                Response::new(404, "Not found").with_result(result)
            }
        })
    }

    async fn domain_transfer(
        &self,
        req: &Request,
        name: &str,
        action: Option<&str>,
    ) -> Result<Response> {
        let registrar = self.require_auth(req, "to act on transfers").await?;

        match (&req.method, action) {
            (Method::Get, _) => Ok(match self.transfers.query(name).await? {
                TransferStatus::None => {
                    Response::ok(format!("No pending transfer for {name}"))
                }
                TransferStatus::Pending { winner, since } => Response::ok(format!(
                    "Domain {name} has a transfer to registrar {winner} pending (since {})",
                    since.to_rfc3339()
                )),
            }),
            (Method::Post, None) => Ok(match self.transfers.request(name, registrar).await? {
                TransferRequested::AlreadyOwner => Response::ok(format!(
                    "{registrar} is already the registrar of {name}"
                )),
                TransferRequested::AlreadyPending { winner, since } => Response::ok(format!(
                    "Domain {name} already has a transfer to registrar {winner} pending (since {})",
                    since.to_rfc3339()
                )),
                TransferRequested::Started => Response::ok(format!(
                    "Domain {name} transfer to registrar {registrar} started"
                )),
            }),
            (Method::Post, Some(extra)) => {
                let action = TransferAction::parse(extra)
                    .ok_or_else(|| Error::UnknownTransferAction(extra.to_string()))?;
                self.transfers.resolve(name, action, registrar).await?;
                Ok(Response::ok(format!("Transfer of {name} {}", action.done())))
            }
            _ => Err(Error::method(req.method.as_str())),
        }
    }

    async fn contact_resource(&self, req: &Request, raw: &str) -> Result<Response> {
        if raw.is_empty() || raw.contains('/') {
            return Err(Error::InvalidPath(raw.to_string()));
        }

        match req.method {
            Method::Head => {
                let handle = parse_handle(raw)?;
                let record = self.contacts.info(handle).await?;
                Ok(Response::ok(format!("Contact {} exists", record.handle)))
            }
            Method::Get => {
                let handle = parse_handle(raw)?;
                let record = self.contacts.info(handle).await?;
                Ok(Response::ok(format!("Contact {} exists", record.handle))
                    .with_field("name", json!(record.name))
                    .with_field("created", json!(record.created.to_rfc3339())))
            }
            Method::Put => {
                // The path segment is ignored: handles are assigned by the
                // store, not chosen by the client.
                let body = require_body(req, "create contact")?;
                let create = schema::decode_contact_create(body)?;
                let handle = self.contacts.create(&create).await?;
                Ok(Response::new(201, "Created")
                    .with_result(format!("Contact {handle} created"))
                    .with_field("handle", json!(handle)))
            }
            Method::Delete => {
                let handle = raw
                    .parse()
                    .map_err(|_| Error::DoesNotExist(raw.to_string()))?;
                self.contacts.delete(handle).await?;
                Ok(Response::new(202, "Accepted").with_result(format!("{handle} deleted")))
            }
            _ => Err(Error::method(req.method.as_str())),
        }
    }

    async fn require_auth(&self, req: &Request, context: &str) -> Result<u32> {
        let creds = req
            .credentials()
            .ok_or_else(|| Error::Unauthenticated(context.to_string()))?;
        if self.auth.authenticate(creds.registrar, &creds.secret).await? {
            Ok(creds.registrar)
        } else {
            Err(Error::WrongCredentials)
        }
    }
}

fn require_body<'a>(req: &'a Request, action: &str) -> Result<&'a str> {
    match req.body.as_deref() {
        Some(body) if !body.is_empty() => Ok(body),
        _ => Err(Error::EmptyBody(action.to_string())),
    }
}

fn parse_handle(raw: &str) -> Result<u64> {
    raw.parse()
        .map_err(|_| Error::NotFound(format!("Contact {raw}")))
}
