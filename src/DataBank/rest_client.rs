//! # rest_client
//! ## Aim
//! Client for the phase-equilibrium databank REST interface: raw property
//! queries, computed entries, stored insertion profiles and the advanced
//! Mongo-style query passthrough.
//!
//! ## Main Data Structures
//! - `HttpGateway` - transport trait for dependency injection, implemented for
//!   the real blocking reqwest client
//! - `RestAdaptor<C>` - the databank client, generic over the gateway
//!
//! ## Interesting Features
//! - every reply but the query passthrough arrives in the
//!   `{valid_response, response}` / `{error}` envelope and is unwrapped in one
//!   place

use crate::PhaseEq::entries::PhaseEntry;
use crate::PhaseEq::profile::InsertionProfile;
use log::{debug, warn};
use reqwest::blocking::Client;
use serde_json::Value;
use thiserror::Error;
use url::Url;

/// Default service root. Override with `with_endpoint` for mirrors or local
/// test servers.
pub const DEFAULT_REST_ENDPOINT: &str = "http://databank.voltacell.org:8080/rest";

/// Properties the service understands for the `{target}/vasp/{prop}` route.
pub const SUPPORTED_PROPERTIES: [&str; 10] = [
    "energy",
    "energy_per_atom",
    "volume",
    "formula",
    "pretty_formula",
    "nsites",
    "elements",
    "nelements",
    "entry",
    "insertion_profile",
];

/// HTTP transport trait for dependency injection. The API key travels in an
/// `API_KEY` header on GET; POSTed queries carry it in the form body instead.
pub trait HttpGateway {
    fn get_text(&self, url: &str, api_key: &str) -> Result<String, reqwest::Error>;
    fn post_form(&self, url: &str, form: &[(&str, String)]) -> Result<String, reqwest::Error>;
}

// Implementation for the real reqwest client
impl HttpGateway for Client {
    fn get_text(&self, url: &str, api_key: &str) -> Result<String, reqwest::Error> {
        self.get(url).header("API_KEY", api_key).send()?.text()
    }
    fn post_form(&self, url: &str, form: &[(&str, String)]) -> Result<String, reqwest::Error> {
        self.post(url).form(form).send()?.text()
    }
}

/// error types for the databank client
#[derive(Debug, Error)]
pub enum RestError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("URL parsing error: {0}")]
    Url(#[from] url::ParseError),
    #[error("Reply decoding error: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("Service rejected the request: {0}")]
    Api(String),
    #[error("Nothing found for {0}")]
    NothingFound(String),
}

pub struct RestAdaptor<C: HttpGateway> {
    api_key: String,
    endpoint: String,
    gateway: C,
}

impl RestAdaptor<Client> {
    pub fn new(api_key: &str) -> Self {
        Self::with_endpoint(api_key, DEFAULT_REST_ENDPOINT)
    }

    pub fn with_endpoint(api_key: &str, endpoint: &str) -> Self {
        Self::with_gateway(api_key, endpoint, Client::new())
    }
}

impl<C: HttpGateway> RestAdaptor<C> {
    pub fn with_gateway(api_key: &str, endpoint: &str, gateway: C) -> Self {
        RestAdaptor {
            api_key: api_key.to_string(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
            gateway,
        }
    }

    /// Raw property query on the `{target}/vasp/{prop}` route. `target` is a
    /// chemical system ("Li-Fe-F"), a formula ("FeF3") or a material id. The
    /// reply is always a list of per-material objects.
    pub fn get_data(&self, target: &str, prop: &str) -> Result<Vec<Value>, RestError> {
        if !prop.is_empty() && !SUPPORTED_PROPERTIES.contains(&prop) {
            warn!("property {} is not on the supported list", prop);
        }
        let url = Url::parse(&format!("{}/{}/vasp/{}", self.endpoint, target, prop))?;
        debug!("GET {}", url);
        let body = self.gateway.get_text(url.as_str(), &self.api_key)?;
        match Self::parse_envelope(&body)? {
            Value::Array(rows) => Ok(rows),
            other => Err(RestError::Api(format!(
                "expected a list reply, got {}",
                other
            ))),
        }
    }

    /// The computed entry stored for one material id.
    pub fn get_entry_by_material_id(&self, material_id: &str) -> Result<PhaseEntry, RestError> {
        let mut rows = self.get_data(material_id, "entry")?;
        if rows.is_empty() {
            return Err(RestError::NothingFound(material_id.to_string()));
        }
        let raw = rows[0]
            .get_mut("entry")
            .map(Value::take)
            .ok_or_else(|| RestError::Api(format!("row without entry field for {}", material_id)))?;
        Ok(serde_json::from_value(raw)?)
    }

    /// All computed entries of a chemical system, e.g. ["Li", "Fe", "F"] gives
    /// every phase made of any subset of Li, Fe and F. The usual starting
    /// point for electrode construction.
    pub fn get_entries_in_chemsys(&self, elements: &[&str]) -> Result<Vec<PhaseEntry>, RestError> {
        let chemsys = elements.join("-");
        let rows = self.get_data(&chemsys, "entry")?;
        let mut entries = Vec::with_capacity(rows.len());
        for mut row in rows {
            let raw = row
                .get_mut("entry")
                .map(Value::take)
                .ok_or_else(|| RestError::Api(format!("row without entry field for {}", chemsys)))?;
            entries.push(serde_json::from_value(raw)?);
        }
        debug!("chemsys {} gave {} entries", chemsys, entries.len());
        Ok(entries)
    }

    /// The stored analyzer profile of `formula` against `working_ion`.
    pub fn get_stored_profile(
        &self,
        formula: &str,
        working_ion: &str,
    ) -> Result<InsertionProfile, RestError> {
        let rows = self.get_data(formula, "insertion_profile")?;
        for mut row in rows {
            let raw = match row.get_mut("insertion_profile").map(Value::take) {
                Some(raw) => raw,
                None => continue,
            };
            let profile: InsertionProfile = serde_json::from_value(raw)?;
            if profile.working_ion == working_ion {
                if profile.target_formula != formula {
                    warn!(
                        "stored profile for {} is keyed on {}, using it anyway",
                        formula, profile.target_formula
                    );
                }
                return Ok(profile);
            }
        }
        Err(RestError::NothingFound(format!(
            "{} / {}",
            formula, working_ion
        )))
    }

    /// Advanced Mongo-style query passthrough. `criteria` is a mongo-like
    /// filter document, `properties` the fields to return. The reply comes
    /// back raw, without the envelope.
    pub fn query(&self, criteria: &Value, properties: &[&str]) -> Result<Value, RestError> {
        let url = Url::parse(&format!("{}/mpquery", self.endpoint))?;
        let form = [
            ("criteria", criteria.to_string()),
            ("properties", serde_json::to_string(properties)?),
            ("API_KEY", self.api_key.clone()),
        ];
        debug!("POST {}", url);
        let body = self.gateway.post_form(url.as_str(), &form)?;
        Ok(serde_json::from_str(&body)?)
    }

    fn parse_envelope(body: &str) -> Result<Value, RestError> {
        let mut data: Value = serde_json::from_str(body)?;
        if data.get("valid_response").and_then(Value::as_bool) == Some(true) {
            return Ok(data["response"].take());
        }
        let msg = match data.get("error").and_then(Value::as_str) {
            Some(err) => err.to_string(),
            None => "reply carries neither a valid response nor an error".to_string(),
        };
        Err(RestError::Api(msg))
    }
}
