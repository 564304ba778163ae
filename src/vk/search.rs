//! Candidate search through a user token

use super::api::VkApi;
use super::types::{ItemList, VkPhoto, VkUser};
use super::VkError;
use crate::candidate::{Candidate, MAX_PHOTOS};
use crate::criteria::Criteria;
use crate::error::CollaboratorError;
use crate::runtime::CandidateSearch;
use async_trait::async_trait;
use std::time::Duration;

pub const DEFAULT_SEARCH_COUNT: u32 = 10;

const SEARCH_FIELDS: &str = "city,sex,bdate,photo_max";

/// Profile photos inspected per candidate
const PHOTOS_PER_PROFILE: u32 = 10;

/// User tokens are limited to three calls per second
const PHOTO_REQUEST_INTERVAL: Duration = Duration::from_millis(340);

pub struct VkSearch {
    api: VkApi,
    count: u32,
}

impl VkSearch {
    /// `api` must carry a user token; community tokens cannot call `users.search`
    pub fn new(api: VkApi, count: u32) -> Self {
        Self { api, count }
    }

    async fn find_users(&self, criteria: &Criteria) -> Result<Vec<VkUser>, VkError> {
        let age = criteria.age.years().to_string();
        let params = [
            ("hometown", criteria.city.as_str().to_string()),
            ("sex", criteria.gender.sex_code().to_string()),
            ("age_from", age.clone()),
            ("age_to", age),
            ("count", self.count.to_string()),
            ("fields", SEARCH_FIELDS.to_string()),
        ];
        let found: ItemList<VkUser> = self.api.call("users.search", &params).await?;
        Ok(found.items)
    }

    async fn top_photos(&self, owner_id: i64) -> Result<Vec<String>, VkError> {
        let params = [
            ("owner_id", owner_id.to_string()),
            ("album_id", "profile".to_string()),
            ("extended", "1".to_string()),
            ("count", PHOTOS_PER_PROFILE.to_string()),
        ];
        let photos: ItemList<VkPhoto> = self.api.call("photos.get", &params).await?;
        Ok(rank_photos(photos.items))
    }
}

/// Largest size of each photo, most liked first
fn rank_photos(photos: Vec<VkPhoto>) -> Vec<String> {
    let mut ranked: Vec<(u64, String)> = photos
        .into_iter()
        .filter_map(|photo| {
            let likes = photo.likes.map_or(0, |l| l.count);
            photo
                .sizes
                .into_iter()
                .max_by_key(|size| size.width * size.height)
                .map(|size| (likes, size.url))
        })
        .collect();
    ranked.sort_by(|a, b| b.0.cmp(&a.0));
    ranked.into_iter().take(MAX_PHOTOS).map(|(_, url)| url).collect()
}

#[async_trait]
impl CandidateSearch for VkSearch {
    async fn search(&self, criteria: &Criteria) -> Result<Vec<Candidate>, CollaboratorError> {
        let users = self.find_users(criteria).await?;
        tracing::info!(found = users.len(), "users.search completed");

        let mut candidates = Vec::with_capacity(users.len());
        for user in users.into_iter().filter(|u| matches!(u.sex, 1 | 2)) {
            let photos = match self.top_photos(user.id).await {
                Ok(photos) => photos,
                Err(e) => {
                    tracing::warn!(vk_id = user.id, error = %e, "Failed to fetch photos");
                    Vec::new()
                }
            };
            candidates.push(Candidate::new(user.id, user.first_name, user.last_name, photos));
            tokio::time::sleep(PHOTO_REQUEST_INTERVAL).await;
        }
        Ok(candidates)
    }
}
