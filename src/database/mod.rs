pub mod memory_store;
pub mod mongo_store;
pub mod store;

pub use memory_store::MemoryUserStore;
pub use mongo_store::MongoUserStore;
pub use store::*;

use mongodb::{Client, Collection, Database};
use std::error::Error;

#[derive(Clone)]
pub struct MongoDB {
    client: Client,
    db: Database,
}

impl MongoDB {
    pub async fn new(uri: &str) -> Result<Self, Box<dyn Error>> {
        let mut client_options = mongodb::options::ClientOptions::parse(uri).await?;

        // Connection pool
        client_options.max_pool_size = Some(20);
        client_options.min_pool_size = Some(5);
        client_options.max_idle_time = Some(std::time::Duration::from_secs(300));

        client_options.connect_timeout = Some(std::time::Duration::from_secs(5));
        client_options.server_selection_timeout = Some(std::time::Duration::from_secs(5));

        let client = Client::with_options(client_options)?;

        // Extract database name from URI or use default
        let db_name = uri
            .rsplit('/')
            .next()
            .and_then(|s| s.split('?').next())
            .filter(|s| !s.is_empty() && !s.contains(':'))
            .unwrap_or("social");

        let db = client.database(db_name);

        // Test connection
        db.list_collection_names().await?;

        let mongodb = Self { client, db };
        mongodb.ensure_indexes().await?;

        Ok(mongodb)
    }

    /// Creates the indexes used by profile lookups and follower queries
    async fn ensure_indexes(&self) -> Result<(), Box<dyn Error>> {
        use mongodb::bson::doc;
        use mongodb::options::IndexOptions;
        use mongodb::IndexModel;

        log::info!("🔧 Creating database indexes...");

        let users = self.database().collection::<mongodb::bson::Document>(mongo_store::USERS_COLLECTION);

        let email_index = IndexModel::builder()
            .keys(doc! { "email": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();

        match users.create_index(email_index).await {
            Ok(_) => log::info!("   ✅ Index created: users(email) unique"),
            Err(e) => log_index_failure("users(email) unique", &e),
        }

        // Multikey indexes: "who follows X" / "who does X follow"
        for field in ["followers", "following"] {
            let mut keys = mongodb::bson::Document::new();
            keys.insert(field, 1);
            let index = IndexModel::builder().keys(keys).build();
            match users.create_index(index).await {
                Ok(_) => log::info!("   ✅ Index created: users({})", field),
                Err(e) => log_index_failure(field, &e),
            }
        }

        log::info!("✅ Database indexes ready");

        Ok(())
    }

    pub fn collection<T: Send + Sync>(&self, name: &str) -> Collection<T> {
        self.db.collection(name)
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn client(&self) -> &Client {
        &self.client
    }
}

// IndexOptionsConflict / IndexKeySpecsConflict
const EXISTING_INDEX_CODES: [i32; 2] = [85, 86];

fn is_existing_index(code: Option<i32>, message: &str) -> bool {
    code.map_or(false, |c| EXISTING_INDEX_CODES.contains(&c)) || message.contains("already exists")
}

fn log_index_failure(index: &str, e: &mongodb::error::Error) {
    let code = match e.kind.as_ref() {
        mongodb::error::ErrorKind::Command(command) => Some(command.code),
        _ => None,
    };
    if is_existing_index(code, &e.to_string()) {
        log::debug!("   ℹ️  Index already exists: {} ({})", index, e);
    } else {
        // Ex.: emails duplicados impedem o índice único
        log::warn!("   ⚠️  Index {} not created: {}", index, e);
    }
}
