use actix_web::{dev::Payload, http::header, web, Error, FromRequest, HttpRequest};
use futures::future::{ready, Ready};

use crate::state::AppState;

const MAX_USER_AGENT_LENGTH: usize = 512;

/// Appareil à l'origine de la requête (clé du limiteur, métadonnées de session)
#[derive(Debug, Clone, Default)]
pub struct ClientInfo {
    pub address: String,
    pub user_agent: Option<String>,
}

impl ClientInfo {
    pub fn from_request_parts(req: &HttpRequest, trust_proxy_headers: bool) -> Self {
        // X-Forwarded-For n'est lu que derrière un proxy de confiance
        let address = if trust_proxy_headers {
            req.connection_info().realip_remote_addr().map(str::to_string)
        } else {
            req.peer_addr().map(|addr| addr.ip().to_string())
        };

        let user_agent = req
            .headers()
            .get(header::USER_AGENT)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.chars().take(MAX_USER_AGENT_LENGTH).collect());

        Self {
            address: address.unwrap_or_else(|| "unknown".to_string()),
            user_agent,
        }
    }
}

impl FromRequest for ClientInfo {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let trust_proxy_headers = req
            .app_data::<web::Data<AppState>>()
            .map(|state| state.config.trust_proxy_headers)
            .unwrap_or(false);

        ready(Ok(Self::from_request_parts(req, trust_proxy_headers)))
    }
}
