use std::future::Future;

use redis::{aio::MultiplexedConnection, AsyncCommands, FromRedisValue, ToRedisArgs};
use redis_macros::{FromRedisValue, ToRedisArgs};
use serde::{Deserialize, Serialize};

use crate::error::CacheError;

// Caching - keys

#[derive(Serialize, Clone, Debug)]
pub struct CacheKey<T: ToString + Serialize> {
    _value: T,
    _type: CacheKeyType,
}

impl<T: ToString + Serialize> CacheKey<T> {
    pub fn from(r#type: CacheKeyType, key: T) -> Self {
        Self {
            _value: key,
            _type: r#type,
        }
    }

    pub fn to_string(&self) -> String {
        self.into()
    }
}

impl<T: ToString + Serialize> Into<String> for &CacheKey<T> {
    fn into(self) -> String {
        match self._type {
            CacheKeyType::Ingredient => format!("ingredient-{}", self._value.to_string()),
            CacheKeyType::Favorites => format!("favorites-{}", self._value.to_string()),
            CacheKeyType::Custom(_) => self._value.to_string(),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub enum CacheKeyType {
    Ingredient,
    Favorites,
    Custom(String),
}

impl CacheKeyType {
    pub fn new<T: ToString + Serialize>(self, key: T) -> CacheKey<T> {
        CacheKey::from(self, key)
    }
}

impl<T: ToString + Serialize> Into<CacheLifetime> for CacheKey<T> {
    fn into(self) -> CacheLifetime {
        match self._type {
            CacheKeyType::Ingredient => CacheLifetime::BindIngredientCache,
            CacheKeyType::Favorites => CacheLifetime::BindFavoriteCache,
            CacheKeyType::Custom(value) => CacheLifetime::Custom(value),
        }
    }
}

// Cache - wrappers

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub enum CacheLifetime {
    Custom(String),
    BindIngredientCache,
    BindFavoriteCache,
}

impl CacheLifetime {
    /// Redis key holding the current bind of this lifetime.
    pub fn bind_key(&self) -> Option<&'static str> {
        match self {
            CacheLifetime::BindIngredientCache => Some("ingredient-cache-key"),
            CacheLifetime::BindFavoriteCache => Some("favorite-cache-key"),
            CacheLifetime::Custom(_) => None,
        }
    }

    pub async fn get_cache_bind(
        &self,
        cache: &mut MultiplexedConnection,
    ) -> Result<Option<String>, CacheError> {
        match (self, self.bind_key()) {
            (CacheLifetime::Custom(value), _) => Ok(Some(value.to_owned())),
            (_, Some(bind_key)) => get_cache_value::<&str, String>(bind_key, cache).await,
            (_, None) => Ok(None),
        }
    }

    pub async fn validate_cache_bind(
        &self,
        bind: &Option<String>,
        lifetime: Self,
        cache: &mut MultiplexedConnection,
    ) -> Result<bool, CacheError> {
        match self {
            CacheLifetime::Custom(value) => match lifetime {
                CacheLifetime::Custom(_value) => Ok(value == &_value),
                _ => {
                    log::error!("Found conflicting bindings");
                    Err(CacheError::new(String::from("Conflicting cache bindings")))
                }
            },
            _ => Ok(bind == &self.get_cache_bind(cache).await?),
        }
    }

    /// Moves the bind forward, invalidating every value stored under the old one.
    pub async fn rebind(&self, cache: &mut MultiplexedConnection) -> Result<(), CacheError> {
        match self.bind_key() {
            Some(bind_key) => {
                let bind = chrono::Utc::now().timestamp_micros().to_string();
                set_cache_value(bind_key, bind, cache).await
            }
            None => Ok(()),
        }
    }
}

#[derive(Serialize, serde::Deserialize, FromRedisValue, ToRedisArgs, Clone)]
pub struct RedisValue<T: serde::Serialize + Send + Sync + Clone> {
    pub value: T,
    _lifetime: CacheLifetime,
    _bind: Option<String>,
}

impl<T: serde::Serialize + Send + Sync + Clone + for<'a> Deserialize<'a>> RedisValue<T> {
    async fn new(
        value: T,
        lifetime: CacheLifetime,
        cache: &mut MultiplexedConnection,
    ) -> Result<Self, CacheError> {
        let bind = lifetime.get_cache_bind(cache).await?;

        Ok(Self {
            value,
            _lifetime: lifetime,
            _bind: bind,
        })
    }

    async fn validate<K: ToString + Serialize>(
        &self,
        key: CacheKey<K>,
        cache: &mut MultiplexedConnection,
    ) -> Result<bool, CacheError> {
        self._lifetime
            .validate_cache_bind(&self._bind, key.into(), cache)
            .await
    }

    /// Returns the cached value under `key`, or runs `callback` and stores its result.
    ///
    /// Cache failures never fail the call, they fall through to `callback`.
    /// Only the callback's own error is returned.
    pub async fn get_or<F, Fut, K, E>(
        key: CacheKey<K>,
        cache: &mut MultiplexedConnection,
        callback: F,
    ) -> Result<T, E>
    where
        K: ToString + Serialize + Clone + Send + Sync,
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, E>> + Send,
    {
        let value = get_cache_value::<String, RedisValue<T>>((&key).into(), cache)
            .await
            .unwrap_or_else(|_| {
                let mut c = cache.clone();
                let k = key.to_string();
                tokio::spawn(async move {
                    log::error!("> Failed to deserialize cached value. Deleting {}", &k);
                    if let Err(e) = delete_cache_value(k, &mut c).await {
                        log::error!("> Failed to delete cached value! {e}");
                    }
                });
                None
            });

        if let Some(value) = value {
            match value.validate(key.to_owned(), cache).await {
                Ok(true) => {
                    log::trace!("> Found {:?}", key.to_string());
                    return Ok(value.value);
                }
                Ok(false) => log::trace!("> Invalidated {:?}", key.to_string()),
                Err(e) => log::error!("> Failed to validate {:?}: {e}", key.to_string()),
            }
        }

        log::trace!("> Fetching {:?}", key.to_string());
        let value = callback().await?;
        let lifetime: CacheLifetime = key.to_owned().into();

        match RedisValue::new(value.clone(), lifetime, cache).await {
            Ok(entry) => {
                if let Err(e) =
                    set_cache_value::<String, RedisValue<T>>((&key).into(), entry, cache).await
                {
                    log::error!("{e}");
                }
            }
            Err(e) => log::error!("> Failed to bind {:?}: {e}", key.to_string()),
        }

        Ok(value)
    }
}

// Cache - raw handlers

pub async fn open_cache(url: &str) -> Result<MultiplexedConnection, CacheError> {
    let client = redis::Client::open(url)?;
    let connection = client.get_multiplexed_async_connection().await?;

    Ok(connection)
}

pub async fn set_cache_value<K: ToRedisArgs + Send + Sync, V: ToRedisArgs + Send + Sync>(
    key: K,
    value: V,
    cache: &mut MultiplexedConnection,
) -> Result<(), CacheError> {
    let _: () = cache.set(key, value).await?;

    Ok(())
}

pub async fn delete_cache_value<K: ToRedisArgs + Send + Sync>(
    key: K,
    cache: &mut MultiplexedConnection,
) -> Result<(), CacheError> {
    let _: () = cache.del(key).await?;

    Ok(())
}

pub async fn get_cache_value<K: ToRedisArgs + Send + Sync, V: FromRedisValue>(
    key: K,
    cache: &mut MultiplexedConnection,
) -> Result<Option<V>, CacheError> {
    let value: Option<V> = cache.get(key).await?;

    Ok(value)
}
