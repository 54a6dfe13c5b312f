//! Settings store implementation shared by the sqlx drivers.
//!
//! MySQL and SQLite both take `?` placeholders, so the same statements and
//! the same read / plan / write / read-back sequence serve both. The macro
//! stamps out one concrete store per driver.

/// Generates a sqlx-backed [`crate::store::SettingsStore`].
///
/// # Parameters
///
/// - `$store_name`: name of the generated struct
/// - `$db`: the sqlx database type (e.g. `sqlx::MySql`)
/// - `$pool`: the matching pool type
/// - `$connection`: the matching connection type
/// - `$backend`: the `StoreBackend` variant reported by the store
macro_rules! define_sqlx_settings_store {
    (
        $(#[$meta:meta])*
        $store_name:ident,
        $db:ty,
        $pool:ty,
        $connection:ty,
        $backend:expr
    ) => {
        $(#[$meta])*
        pub struct $store_name {
            pool: $pool,
            target: String,
        }

        impl std::fmt::Debug for $store_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.debug_struct(stringify!($store_name))
                    .field("target", &self.target)
                    .field("pool_size", &self.pool.size())
                    .finish_non_exhaustive()
            }
        }

        impl $store_name {
            /// Wraps an existing pool.
            ///
            /// `target` is a credential-free description used in logs.
            pub fn from_pool(pool: $pool, target: impl Into<String>) -> Self {
                Self {
                    pool,
                    target: target.into(),
                }
            }

            /// The underlying pool.
            pub fn pool(&self) -> &$pool {
                &self.pool
            }

            async fn begin(&self) -> $crate::Result<sqlx::Transaction<'static, $db>> {
                self.pool.begin().await.map_err(|e| {
                    $crate::error::SettingError::datastore(
                        format!("Failed to start transaction on {}", self.target),
                        e,
                    )
                })
            }

            async fn commit(&self, tx: sqlx::Transaction<'static, $db>) -> $crate::Result<()> {
                tx.commit().await.map_err(|e| {
                    $crate::error::SettingError::datastore(
                        format!("Failed to commit transaction on {}", self.target),
                        e,
                    )
                })
            }

            async fn current_value(
                conn: &mut $connection,
                name: &str,
            ) -> $crate::Result<Option<String>> {
                let mut values: Vec<Option<String>> =
                    sqlx::query_scalar($crate::store::SELECT_VALUE_SQL)
                        .bind(name)
                        .fetch_all(conn)
                        .await
                        .map_err(|e| {
                            $crate::error::SettingError::datastore(
                                format!("Failed to read setting `{}`", name),
                                e,
                            )
                        })?;

                match values.len() {
                    0 => Ok(None),
                    // A NULL value reads as the empty string.
                    1 => Ok(values.pop().map(Option::unwrap_or_default)),
                    rows => Err($crate::error::SettingError::StoreIntegrity {
                        name: name.to_string(),
                        rows,
                    }),
                }
            }

            async fn apply(
                conn: &mut $connection,
                plan: $crate::models::WritePlan,
                name: &str,
                value: &str,
            ) -> $crate::Result<()> {
                let result = match plan {
                    $crate::models::WritePlan::Insert => {
                        sqlx::query($crate::store::INSERT_SQL)
                            .bind(name)
                            .bind(value)
                            .execute(conn)
                            .await
                    }
                    $crate::models::WritePlan::Update => {
                        sqlx::query($crate::store::UPDATE_SQL)
                            .bind(value)
                            .bind(name)
                            .execute(conn)
                            .await
                    }
                    $crate::models::WritePlan::Unchanged => return Ok(()),
                };

                result.map(|_| ()).map_err(|e| {
                    $crate::error::SettingError::datastore(
                        format!("Failed to write setting `{}`", name),
                        e,
                    )
                })
            }
        }

        #[async_trait::async_trait]
        impl $crate::store::SettingsStore for $store_name {
            async fn read_value(&self, name: &str) -> $crate::Result<Option<String>> {
                let mut tx = self.begin().await?;
                let value = Self::current_value(&mut *tx, name).await?;
                self.commit(tx).await?;
                Ok(value)
            }

            async fn upsert(
                &self,
                name: &str,
                value: &str,
            ) -> $crate::Result<$crate::models::SettingOutcome> {
                let mut tx = self.begin().await?;

                let current = Self::current_value(&mut *tx, name).await?;
                let plan = $crate::models::WritePlan::for_values(current.as_deref(), value);
                Self::apply(&mut *tx, plan, name, value).await?;

                let stored = Self::current_value(&mut *tx, name).await?.ok_or_else(|| {
                    $crate::error::SettingError::StoreIntegrity {
                        name: name.to_string(),
                        rows: 0,
                    }
                })?;

                self.commit(tx).await?;

                match plan {
                    $crate::models::WritePlan::Insert => {
                        tracing::info!(setting = name, store = %self.target, "Created setting");
                    }
                    $crate::models::WritePlan::Update => {
                        tracing::info!(setting = name, store = %self.target, "Updated setting");
                    }
                    $crate::models::WritePlan::Unchanged => {
                        tracing::debug!(setting = name, "Setting already up to date");
                    }
                }

                Ok($crate::models::SettingOutcome {
                    name: name.to_string(),
                    value: stored,
                    created: plan.created(),
                    changed: plan.changed(),
                })
            }

            async fn close(&self) {
                self.pool.close().await;
            }

            fn backend(&self) -> $crate::store::StoreBackend {
                $backend
            }

            fn target(&self) -> &str {
                &self.target
            }
        }
    };
}

pub(crate) use define_sqlx_settings_store;
