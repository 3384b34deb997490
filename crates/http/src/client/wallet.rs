//! Wallet and NFT API client methods

use super::{ApiRequest, ClientError, MarketClient};
use crate::types::{MessageResponse, MintNftData, MintNftResponse, TransferNftData};
use bazaar_core::{Nft, NftOwnershipRecord, Wallet};

impl MarketClient {
    pub async fn my_wallet(&self) -> Result<Wallet, ClientError> {
        self.execute(&ApiRequest::get("/wallet/@me")).await
    }

    pub async fn my_nfts(&self) -> Result<Vec<Nft>, ClientError> {
        self.execute(&ApiRequest::get("/wallet/nfts")).await
    }

    /// Mint an ownership token for a product
    pub async fn mint_nft(&self, data: &MintNftData) -> Result<MintNftResponse, ClientError> {
        let req = ApiRequest::post("/wallet/mint").json(data)?;
        self.execute(&req).await
    }

    pub async fn transfer_nft(&self, data: &TransferNftData) -> Result<MessageResponse, ClientError> {
        let req = ApiRequest::post("/wallet/transfer").json(data)?;
        self.execute(&req).await
    }

    /// Ownership history of one token
    pub async fn nft_history(&self, nft_uuid: &str) -> Result<Vec<NftOwnershipRecord>, ClientError> {
        self.execute(&ApiRequest::get(format!("/wallet/nft/{nft_uuid}/history")))
            .await
    }
}
