//! Supabase REST API client using service_role key

use reqwest::{Client, Method, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Serialize};

/// Supabase client for server-side database operations
/// Uses service_role key which bypasses RLS - handle with care!
#[derive(Clone)]
pub struct SupabaseClient {
    client: Client,
    base_url: String,
    service_role_key: String,
}

impl SupabaseClient {
    pub fn new(base_url: &str, service_role_key: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            service_role_key: service_role_key.to_string(),
        }
    }

    /// Get the REST API URL for a table
    fn rest_url(&self, table: &str, query: &str) -> String {
        if query.is_empty() {
            format!("{}/rest/v1/{}", self.base_url, table)
        } else {
            format!("{}/rest/v1/{}?{}", self.base_url, table, query)
        }
    }

    /// Authenticated request builder
    fn request(&self, method: Method, table: &str, query: &str) -> RequestBuilder {
        self.client
            .request(method, self.rest_url(table, query))
            .header("apikey", &self.service_role_key)
            .header("Authorization", format!("Bearer {}", self.service_role_key))
            .header("Content-Type", "application/json")
    }

    /// Send and turn non-2xx statuses into `SupabaseError::Api`
    async fn send(builder: RequestBuilder) -> Result<Response, SupabaseError> {
        let response = builder.send().await.map_err(SupabaseError::Request)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SupabaseError::Api {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response)
    }

    /// GET rows matching a PostgREST query
    pub async fn get<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &str,
    ) -> Result<Vec<T>, SupabaseError> {
        let response = Self::send(self.request(Method::GET, table, query)).await?;
        response.json().await.map_err(SupabaseError::Parse)
    }

    /// GET a single row, `None` when nothing matches
    pub async fn get_one<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &str,
    ) -> Result<Option<T>, SupabaseError> {
        let rows: Vec<T> = self.get(table, &format!("{}&limit=1", query)).await?;
        Ok(rows.into_iter().next())
    }

    /// POST a row and return its stored representation
    pub async fn insert<T: Serialize, R: DeserializeOwned>(
        &self,
        table: &str,
        data: &T,
    ) -> Result<R, SupabaseError> {
        let builder = self
            .request(Method::POST, table, "")
            .header("Prefer", "return=representation")
            .json(data);
        let response = Self::send(builder).await?;

        // PostgREST returns an array, get first element
        let results: Vec<R> = response.json().await.map_err(SupabaseError::Parse)?;
        results
            .into_iter()
            .next()
            .ok_or(SupabaseError::NoRowReturned)
    }

    /// PATCH rows matching `query` and return the rows that were updated.
    /// An empty result means the filter matched nothing.
    pub async fn update_returning<T: Serialize, R: DeserializeOwned>(
        &self,
        table: &str,
        query: &str,
        data: &T,
    ) -> Result<Vec<R>, SupabaseError> {
        let builder = self
            .request(Method::PATCH, table, query)
            .header("Prefer", "return=representation")
            .json(data);
        let response = Self::send(builder).await?;
        response.json().await.map_err(SupabaseError::Parse)
    }

    /// Upsert (insert or merge on the `on_conflict` columns)
    pub async fn upsert<T: Serialize>(
        &self,
        table: &str,
        data: &T,
        on_conflict: &str,
    ) -> Result<(), SupabaseError> {
        let query = format!("on_conflict={}", on_conflict);
        let builder = self
            .request(Method::POST, table, &query)
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(data);
        Self::send(builder).await?;
        Ok(())
    }
}

/// Supabase errors
#[derive(Debug, thiserror::Error)]
pub enum SupabaseError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("API error (status {status}): {body}")]
    Api { status: u16, body: String },

    #[error("Failed to parse response: {0}")]
    Parse(reqwest::Error),

    #[error("No row returned from insert")]
    NoRowReturned,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rest_urls() {
        let client = SupabaseClient::new("https://db.example.test/", "key");
        assert_eq!(client.rest_url("matches", ""), "https://db.example.test/rest/v1/matches");
        assert_eq!(
            client.rest_url("sets", "on_conflict=match_id,set_number"),
            "https://db.example.test/rest/v1/sets?on_conflict=match_id,set_number"
        );
    }
}
