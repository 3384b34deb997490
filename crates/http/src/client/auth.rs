//! Authentication API client methods

use super::{ApiRequest, ClientError, MarketClient};
use crate::types::{ChangePasswordRequest, LoginCredentials, LoginResponse, MessageResponse, SignupData};
use bazaar_core::{LoginHistoryItem, User};
use tracing::{debug, warn};

impl MarketClient {
    /// Create an account; issued credentials are stored
    pub async fn signup(&self, data: &SignupData) -> Result<LoginResponse, ClientError> {
        let req = ApiRequest::post("/auth/signup").json(data)?;
        let response: LoginResponse = self.execute(&req).await?;
        self.store_issued(&response).await?;
        Ok(response)
    }

    /// Log in; issued credentials are stored
    pub async fn login(&self, credentials: &LoginCredentials) -> Result<LoginResponse, ClientError> {
        let req = ApiRequest::post("/auth/login").json(credentials)?;
        let response: LoginResponse = self.execute(&req).await?;
        self.store_issued(&response).await?;
        Ok(response)
    }

    /// Log out. The local credentials are cleared even when the server call fails.
    pub async fn logout(&self) -> Result<(), ClientError> {
        let result = self.execute_unit(&ApiRequest::post("/auth/logout")).await;
        if let Err(e) = &result {
            warn!("Logout request failed, clearing local credentials anyway: {e}");
        }
        self.session().clear().await?;
        result
    }

    /// Current user
    pub async fn me(&self) -> Result<User, ClientError> {
        self.execute(&ApiRequest::get("/auth/@me")).await
    }

    pub async fn login_history(&self) -> Result<Vec<LoginHistoryItem>, ClientError> {
        self.execute(&ApiRequest::get("/auth/login-history")).await
    }

    pub async fn change_password(
        &self,
        old_password: impl Into<String>,
        new_password: impl Into<String>,
    ) -> Result<MessageResponse, ClientError> {
        let req = ApiRequest::post("/auth/change-password").json(&ChangePasswordRequest {
            old_password: old_password.into(),
            new_password: new_password.into(),
        })?;
        self.execute(&req).await
    }

    async fn store_issued(&self, response: &LoginResponse) -> Result<(), ClientError> {
        match response.credentials() {
            Some(credentials) => self.session().store_credentials(credentials).await?,
            None => debug!("Authentication response carried no credential pair"),
        }
        Ok(())
    }
}
