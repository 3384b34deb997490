//! CLI commands

use anyhow::{Result, bail};
use bazaar_core::catalog::COLLECTIONS;
use bazaar_core::{
    DeliveryMethod, ProductQuery, ProductStatus, SearchHistory, SortOrder, TransferType,
};
use bazaar_http::client::product::DEFAULT_RECENT_LIMIT;
use bazaar_http::types::{
    CreateOrderData, CreateProductData, LoginCredentials, MintNftData, ProductAttributesInput,
    ProductFilters, SignupData, TransferNftData,
};
use bazaar_http::{FileTokenStore, MarketClient, MarketClientBuilder, Session, SessionListener};
use clap::builder::PossibleValuesParser;
use clap::{Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

use crate::config;
use crate::output;

/// Number of listings fetched for local search and collections
const CATALOG_FETCH_LIMIT: u32 = 100;

#[derive(Subcommand)]
pub enum Commands {
    /// Log in with a user ID and password
    Login {
        user_id: String,

        #[arg(long, env = "BAZAAR_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Create an account and log in
    Signup {
        user_id: String,

        #[arg(long, env = "BAZAAR_PASSWORD", hide_env_values = true)]
        password: String,

        #[arg(long)]
        name: String,

        #[arg(long)]
        email: String,

        #[arg(long)]
        phone: String,

        /// Birthday as YYYY-MM-DD
        #[arg(long)]
        birthday: String,
    },

    /// Log out and forget the stored credentials
    Logout,

    /// Show the current user
    Me,

    /// Show recent logins
    LoginHistory,

    /// Change the account password
    ChangePassword {
        #[arg(long)]
        old: String,

        #[arg(long)]
        new: String,
    },

    /// Product listings
    Products {
        #[command(subcommand)]
        command: ProductCommands,
    },

    /// Orders as buyer or seller
    Orders {
        #[command(subcommand)]
        command: OrderCommands,
    },

    /// Wallet and NFT ownership certificates
    Wallet {
        #[command(subcommand)]
        command: WalletCommands,
    },

    /// Recent search queries
    History {
        #[command(subcommand)]
        command: HistoryCommands,
    },

    /// Client configuration files
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum ProductCommands {
    /// List products with server-side filters
    List {
        #[arg(long)]
        category: Option<String>,

        #[arg(long)]
        status: Option<StatusArg>,

        /// Only products with an NFT certificate
        #[arg(long)]
        nft_only: bool,

        #[arg(long)]
        page: Option<u32>,

        #[arg(long)]
        limit: Option<u32>,
    },

    /// Show one product
    Show { uuid: String },

    /// Products you listed
    Mine,

    /// Products you viewed recently
    Recent {
        #[arg(long, default_value_t = DEFAULT_RECENT_LIMIT)]
        limit: u32,
    },

    /// Search product names and descriptions
    Search {
        query: String,

        #[arg(long)]
        category: Option<String>,

        #[arg(long)]
        min_price: Option<u64>,

        #[arg(long)]
        max_price: Option<u64>,

        #[arg(long)]
        nft_only: bool,

        /// latest, price-low or price-high
        #[arg(long, default_value = "latest")]
        sort: SortOrder,
    },

    /// Browse a named collection
    Collection {
        #[arg(value_parser = PossibleValuesParser::new(COLLECTIONS))]
        slug: String,

        /// latest, price-low or price-high
        #[arg(long, default_value = "latest")]
        sort: SortOrder,
    },

    /// List a new product
    Create {
        #[arg(long)]
        name: String,

        #[arg(long)]
        description: String,

        /// Price in won
        #[arg(long)]
        price: u64,

        #[arg(long)]
        category: String,

        #[arg(long)]
        thumbnail_url: Option<String>,

        #[arg(long)]
        verified_brand: Option<String>,
    },

    /// Delete one of your products
    Delete { uuid: String },
}

#[derive(Subcommand)]
pub enum OrderCommands {
    /// Orders you placed
    Buyer,

    /// Orders placed with you
    Seller,

    /// Show one order
    Show { uuid: String },

    /// Order a product
    Create {
        product_uuid: String,

        #[arg(long)]
        seller_uuid: String,

        #[arg(long, default_value_t = 1)]
        quantity: u32,

        #[arg(long, default_value = "parcel")]
        delivery: DeliveryArg,

        #[arg(long)]
        address: Option<String>,

        #[arg(long)]
        recipient_name: Option<String>,

        #[arg(long)]
        recipient_phone: Option<String>,

        #[arg(long)]
        message: Option<String>,
    },

    /// Accept an order (seller)
    Accept {
        uuid: String,

        #[arg(long)]
        message: Option<String>,
    },

    /// Reject an order (seller)
    Reject {
        uuid: String,

        #[arg(long)]
        message: Option<String>,
    },

    /// Cancel an order (buyer)
    Cancel { uuid: String },

    /// Mark an order as shipped (seller)
    Ship { uuid: String, tracking_number: String },

    /// Mark an order as delivered
    Delivered { uuid: String },

    /// Confirm receipt (buyer)
    Complete { uuid: String },
}

#[derive(Subcommand)]
pub enum WalletCommands {
    /// Show your wallet
    Show,

    /// NFTs you own
    Nfts,

    /// Ownership history of an NFT
    History { nft_uuid: String },

    /// Mint an ownership certificate for a product
    Mint {
        product_uuid: String,

        #[arg(long)]
        serial_number: String,

        #[arg(long)]
        brand_name: String,

        #[arg(long)]
        warranty_uuid: Option<String>,
    },

    /// Transfer an NFT to another wallet
    Transfer {
        nft_uuid: String,

        #[arg(long)]
        to_wallet: String,

        #[arg(long, default_value = "transfer")]
        transfer_type: TransferArg,

        #[arg(long)]
        order_uuid: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum HistoryCommands {
    /// Show recent searches, most recent first
    List,

    /// Forget one search
    Remove { query: String },

    /// Forget all searches
    Clear,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Generate a default client configuration file
    Init {
        /// Output file path (defaults to <data-dir>/config.json)
        output: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Show the effective configuration
    Show,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum StatusArg {
    Available,
    Sold,
    OutOfStock,
    Discontinued,
}

impl From<StatusArg> for ProductStatus {
    fn from(status: StatusArg) -> Self {
        match status {
            StatusArg::Available => Self::Available,
            StatusArg::Sold => Self::Sold,
            StatusArg::OutOfStock => Self::OutOfStock,
            StatusArg::Discontinued => Self::Discontinued,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum DeliveryArg {
    Direct,
    Parcel,
}

impl From<DeliveryArg> for DeliveryMethod {
    fn from(delivery: DeliveryArg) -> Self {
        match delivery {
            DeliveryArg::Direct => Self::Direct,
            DeliveryArg::Parcel => Self::Parcel,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum TransferArg {
    Purchase,
    Transfer,
    Gift,
}

impl From<TransferArg> for TransferType {
    fn from(transfer: TransferArg) -> Self {
        match transfer {
            TransferArg::Purchase => Self::Purchase,
            TransferArg::Transfer => Self::Transfer,
            TransferArg::Gift => Self::Gift,
        }
    }
}

/// Tells the user to sign in again once their session cannot be renewed
struct ReloginHint;

impl SessionListener for ReloginHint {
    fn session_ended(&self, redirect_to: &str) {
        eprintln!("Your session has expired. Run `bazaar login` to sign in again ({redirect_to}).");
    }
}

/// Everything a command needs: the client and the local search history
struct Context {
    client: MarketClient,
    history: SearchHistory,
}

impl Context {
    fn open(data_dir: &Path, config_path: Option<&Path>) -> Result<Self> {
        let client_config = config::load_client_config(data_dir, config_path)?;

        let store = Arc::new(FileTokenStore::new(data_dir.join(config::TOKEN_FILE)));
        let session = Session::new(store)
            .with_listener(Arc::new(ReloginHint))
            .with_auth_entry(client_config.auth_entry.clone());

        let client = MarketClientBuilder::from_config(&client_config)
            .session(session)
            .build()?;

        Ok(Self {
            client,
            history: SearchHistory::new(data_dir.join(config::SEARCH_HISTORY_FILE)),
        })
    }
}

impl Commands {
    pub async fn execute(self, data_dir: PathBuf, config_path: Option<PathBuf>) -> Result<()> {
        // Local-only commands need neither configuration nor a client
        let command = match self {
            Self::Config { command } => return command.execute(&data_dir, config_path.as_deref()),
            Self::History { command } => {
                let history = SearchHistory::new(data_dir.join(config::SEARCH_HISTORY_FILE));
                return command.execute(&history);
            }
            command => command,
        };

        let ctx = Context::open(&data_dir, config_path.as_deref())?;
        let client = &ctx.client;

        match command {
            Self::Login { user_id, password } => {
                let response = client
                    .login(&LoginCredentials::password(user_id, password))
                    .await?;
                if !client.is_authenticated().await? {
                    bail!("Login succeeded but the server issued no credentials");
                }
                match response.user {
                    Some(user) => println!("Logged in as {} ({})", user.name, user.user_id),
                    None => println!("Logged in"),
                }
                Ok(())
            }
            Self::Signup {
                user_id,
                password,
                name,
                email,
                phone,
                birthday,
            } => {
                let data = SignupData {
                    login: LoginCredentials::password(user_id, password),
                    name,
                    email,
                    phone,
                    birthday,
                };
                client.signup(&data).await?;
                println!("Account created for {}", data.name);
                Ok(())
            }
            Self::Logout => {
                // Credentials are gone whether or not the server acknowledged
                if let Err(e) = client.logout().await {
                    info!("Server-side logout failed: {e}");
                }
                println!("Logged out");
                Ok(())
            }
            Self::Me => {
                let user = client.me().await?;
                println!("{} ({})", user.name, user.user_id);
                println!("  email:  {}", user.email);
                if let Some(phone) = &user.phone {
                    println!("  phone:  {phone}");
                }
                println!("  status: {}", user.status);
                println!("  points: {}", user.points());
                Ok(())
            }
            Self::LoginHistory => {
                for item in client.login_history().await? {
                    println!("{}  {}", item.login_at.format("%Y-%m-%d %H:%M:%S"), item.ip);
                }
                Ok(())
            }
            Self::ChangePassword { old, new } => {
                let response = client.change_password(old, new).await?;
                println!("{}", response.message);
                Ok(())
            }
            Self::Products { command } => command.execute(&ctx).await,
            Self::Orders { command } => command.execute(client).await,
            Self::Wallet { command } => command.execute(client).await,
            // handled above
            Self::Config { .. } | Self::History { .. } => Ok(()),
        }
    }
}

impl ProductCommands {
    async fn execute(self, ctx: &Context) -> Result<()> {
        let client = &ctx.client;

        match self {
            Self::List {
                category,
                status,
                nft_only,
                page,
                limit,
            } => {
                let filters = ProductFilters {
                    category,
                    status: status.map(Into::into),
                    has_nft: nft_only.then_some(true),
                    page,
                    limit,
                };
                let page = client.products(&filters).await?;
                output::print_products(&page.products);
                println!(
                    "page {}/{} ({} total)",
                    page.pagination.page, page.pagination.total_pages, page.pagination.total
                );
                Ok(())
            }
            Self::Show { uuid } => output::print_json(&client.product(&uuid).await?),
            Self::Mine => {
                output::print_products(&client.my_products().await?);
                Ok(())
            }
            Self::Recent { limit } => {
                output::print_products(&client.recent_products(limit).await?);
                Ok(())
            }
            Self::Search {
                query,
                category,
                min_price,
                max_price,
                nft_only,
                sort,
            } => {
                if let Err(e) = ctx.history.add(&query) {
                    warn!("Failed to record search: {e}");
                }

                let mut local = ProductQuery::search(&query)
                    .price_range(min_price, max_price)
                    .nft_only(nft_only)
                    .sort(sort);
                if let Some(category) = &category {
                    local = local.category(category);
                }

                let filters = ProductFilters {
                    category,
                    limit: Some(CATALOG_FETCH_LIMIT),
                    ..ProductFilters::default()
                };
                let page = client.products(&filters).await?;
                output::print_products(&local.apply(&page.products));
                Ok(())
            }
            Self::Collection { slug, sort } => {
                let local = ProductQuery::collection(&slug)?.sort(sort);
                let filters = ProductFilters {
                    has_nft: local.nft_only.then_some(true),
                    limit: Some(CATALOG_FETCH_LIMIT),
                    ..ProductFilters::default()
                };
                let page = client.products(&filters).await?;
                output::print_products(&local.apply(&page.products));
                Ok(())
            }
            Self::Create {
                name,
                description,
                price,
                category,
                thumbnail_url,
                verified_brand,
            } => {
                let attributes = (thumbnail_url.is_some() || verified_brand.is_some()).then(|| {
                    ProductAttributesInput {
                        thumbnail_url,
                        verified_brand,
                        ..ProductAttributesInput::default()
                    }
                });
                let product = client
                    .create_product(&CreateProductData {
                        name,
                        description,
                        price,
                        category,
                        attributes,
                    })
                    .await?;
                println!("Created {}", output::product_line(&product));
                Ok(())
            }
            Self::Delete { uuid } => {
                let response = client.delete_product(&uuid).await?;
                println!("{}", response.message);
                Ok(())
            }
        }
    }
}

impl OrderCommands {
    async fn execute(self, client: &MarketClient) -> Result<()> {
        let order = match self {
            Self::Buyer => {
                output::print_orders(&client.buyer_orders().await?);
                return Ok(());
            }
            Self::Seller => {
                output::print_orders(&client.seller_orders().await?);
                return Ok(());
            }
            Self::Show { uuid } => return output::print_json(&client.order(&uuid).await?),
            Self::Create {
                product_uuid,
                seller_uuid,
                quantity,
                delivery,
                address,
                recipient_name,
                recipient_phone,
                message,
            } => {
                let delivery_method = DeliveryMethod::from(delivery);
                if delivery_method == DeliveryMethod::Parcel && address.is_none() {
                    bail!("--address is required for parcel delivery");
                }
                client
                    .create_order(&CreateOrderData {
                        product_uuid,
                        seller_uuid,
                        quantity,
                        delivery_method,
                        delivery_address: address,
                        recipient_name,
                        recipient_phone,
                        buyer_message: message,
                    })
                    .await?
            }
            Self::Accept { uuid, message } => client.accept_order(&uuid, message).await?,
            Self::Reject { uuid, message } => client.reject_order(&uuid, message).await?,
            Self::Cancel { uuid } => client.cancel_order(&uuid).await?,
            Self::Ship {
                uuid,
                tracking_number,
            } => client.ship_order(&uuid, tracking_number).await?,
            Self::Delivered { uuid } => client.mark_delivered(&uuid).await?,
            Self::Complete { uuid } => client.complete_order(&uuid).await?,
        };

        println!("Order {} is now {:?}", order.order_number, order.status);
        Ok(())
    }
}

impl WalletCommands {
    async fn execute(self, client: &MarketClient) -> Result<()> {
        match self {
            Self::Show => {
                let wallet = client.my_wallet().await?;
                println!("{}  {}", wallet.uuid, wallet.wallet_address);
                println!("  owner:  {}", wallet.user.name);
                println!("  active: {}", wallet.is_active);
                Ok(())
            }
            Self::Nfts => {
                output::print_nfts(&client.my_nfts().await?);
                Ok(())
            }
            Self::History { nft_uuid } => {
                output::print_ownership_history(&client.nft_history(&nft_uuid).await?);
                Ok(())
            }
            Self::Mint {
                product_uuid,
                serial_number,
                brand_name,
                warranty_uuid,
            } => {
                let minted = client
                    .mint_nft(&MintNftData {
                        product_uuid,
                        warranty_uuid,
                        serial_number,
                        brand_name,
                    })
                    .await?;
                println!("Minted token #{} ({})", minted.nft.token_id, minted.nft.uuid);
                Ok(())
            }
            Self::Transfer {
                nft_uuid,
                to_wallet,
                transfer_type,
                order_uuid,
            } => {
                let response = client
                    .transfer_nft(&TransferNftData {
                        nft_uuid,
                        to_wallet_uuid: to_wallet,
                        transfer_type: transfer_type.into(),
                        order_uuid,
                    })
                    .await?;
                println!("{}", response.message);
                Ok(())
            }
        }
    }
}

impl HistoryCommands {
    fn execute(self, history: &SearchHistory) -> Result<()> {
        match self {
            Self::List => {
                let entries = history.entries();
                if entries.is_empty() {
                    println!("No recent searches");
                }
                for entry in entries {
                    println!("{entry}");
                }
            }
            Self::Remove { query } => history.remove(&query)?,
            Self::Clear => {
                history.clear()?;
                println!("Search history cleared");
            }
        }
        Ok(())
    }
}

impl ConfigCommands {
    fn execute(self, data_dir: &Path, config_path: Option<&Path>) -> Result<()> {
        match self {
            Self::Init { output, force } => {
                let config_path = output.unwrap_or_else(|| data_dir.join(config::CONFIG_FILE));
                config::generate_default_config(&config_path, force)?;
                println!(
                    "Generated client configuration at: {}",
                    config_path.display()
                );
                Ok(())
            }
            Self::Show => {
                let client_config = config::load_client_config(data_dir, config_path)?;
                output::print_json(&client_config)
            }
        }
    }
}
