//! Nearest-neighbour search over the pre-embedded work-culture collection.

use std::collections::HashMap;

use async_trait::async_trait;
use qdrant_client::qdrant::{
    point_id::PointIdOptions, value::Kind, PointId, Query, QueryPointsBuilder, ScoredPoint,
    Value,
};
use qdrant_client::Qdrant;
use tracing::debug;

use crate::errors::AppError;
use crate::models::CultureMatch;
use crate::stores::CultureSimilarityIndex;

pub struct QdrantCultureIndex {
    client: Qdrant,
    collection: String,
    vector_dim: usize,
}

impl QdrantCultureIndex {
    pub fn new(
        url: &str,
        api_key: Option<String>,
        collection: String,
        vector_dim: usize,
    ) -> Result<Self, AppError> {
        let client = Qdrant::from_url(url).api_key(api_key).build()?;
        Ok(Self {
            client,
            collection,
            vector_dim,
        })
    }
}

#[async_trait]
impl CultureSimilarityIndex for QdrantCultureIndex {
    async fn nearest_cultures(
        &self,
        vector: &[f32],
        k: usize,
    ) -> Result<Vec<CultureMatch>, AppError> {
        if vector.len() != self.vector_dim {
            return Err(AppError::Vector(format!(
                "query vector has {} dimensions, collection '{}' expects {}",
                vector.len(),
                self.collection,
                self.vector_dim
            )));
        }

        let search = QueryPointsBuilder::new(self.collection.clone())
            .query(Query::new_nearest(vector.to_vec()))
            .limit(k as u64)
            .with_payload(true);
        let response = self.client.query(search).await?;

        let mut matches: Vec<CultureMatch> =
            response.result.iter().map(culture_match_from_point).collect();
        // Highest score first.
        matches.sort_by(|a, b| b.score.total_cmp(&a.score));

        debug!(
            "Culture search on '{}' returned {} hits",
            self.collection,
            matches.len()
        );
        Ok(matches)
    }
}

fn culture_match_from_point(point: &ScoredPoint) -> CultureMatch {
    CultureMatch {
        culture_id: point.id.as_ref().map(point_id_to_string).unwrap_or_default(),
        score: point.score,
        culture_type: payload_string(&point.payload, "culture_type").unwrap_or_default(),
        description: payload_string(&point.payload, "description").unwrap_or_default(),
        characteristics: payload_strings(&point.payload, "characteristics"),
    }
}

fn point_id_to_string(point_id: &PointId) -> String {
    match &point_id.point_id_options {
        Some(PointIdOptions::Num(n)) => n.to_string(),
        Some(PointIdOptions::Uuid(id)) => id.clone(),
        None => String::new(),
    }
}

fn payload_string(payload: &HashMap<String, Value>, key: &str) -> Option<String> {
    match &payload.get(key)?.kind {
        Some(Kind::StringValue(text)) => Some(text.clone()),
        _ => None,
    }
}

fn payload_strings(payload: &HashMap<String, Value>, key: &str) -> Vec<String> {
    match payload.get(key).and_then(|v| v.kind.as_ref()) {
        Some(Kind::ListValue(list)) => list
            .values
            .iter()
            .filter_map(|v| match &v.kind {
                Some(Kind::StringValue(text)) => Some(text.clone()),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}
