use serde::{Deserialize, Deserializer, Serialize};
use std::fmt::Display;

/// Identifier of a show within the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShowId(pub u64);

impl Display for ShowId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for ShowId {
    fn from(id: u64) -> Self {
        ShowId(id)
    }
}

/// Audio language of a show
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[serde(alias = "Español", alias = "es")]
    Spanish,
    #[serde(alias = "Inglés", alias = "en")]
    English,
}

/// Broadcast status of a show
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AirStatus {
    #[serde(alias = "En emisión")]
    Airing,
    #[serde(alias = "Finalizado")]
    Finished,
    #[serde(alias = "Próximamente")]
    Upcoming,
}

/// A catalog entry rendered in rows, grids and detail views
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Show {
    pub id: ShowId,
    pub title: String,
    pub image_url: String,
    pub rating: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<Language>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<u16>,
    /// Always a list; a bare string on input becomes a single genre
    #[serde(default, deserialize_with = "genre_list")]
    pub genre: Vec<String>,
    #[serde(default, alias = "episodes", skip_serializing_if = "Option::is_none")]
    pub episode_count: Option<u32>,
    #[serde(default)]
    pub is_new: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, alias = "status", skip_serializing_if = "Option::is_none")]
    pub air_status: Option<AirStatus>,
}

impl Show {
    /// Creates a show with only the required fields set
    pub fn new(id: impl Into<ShowId>, title: impl Into<String>, image_url: impl Into<String>, rating: f32) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            image_url: image_url.into(),
            rating,
            language: None,
            year: None,
            genre: Vec::new(),
            episode_count: None,
            is_new: false,
            description: None,
            country: None,
            air_status: None,
        }
    }
}

fn genre_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
        Some(OneOrMany::One(genre)) => vec![genre],
        Some(OneOrMany::Many(genres)) => genres,
        None => Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_show_id_display() {
        assert_eq!(ShowId(42).to_string(), "42");
    }

    #[test]
    fn test_minimal_show_deserializes() {
        let show: Show = serde_json::from_value(json!({
            "id": 7,
            "title": "Crash Landing on You",
            "imageUrl": "https://img.example/cloy.jpg",
            "rating": 9.1
        }))
        .unwrap();

        assert_eq!(show.id, ShowId(7));
        assert!(show.genre.is_empty());
        assert!(!show.is_new);
        assert_eq!(show.air_status, None);
    }

    #[test]
    fn test_single_genre_string_becomes_list() {
        let show: Show = serde_json::from_value(json!({
            "id": 1,
            "title": "Vincenzo",
            "imageUrl": "https://img.example/v.jpg",
            "rating": 8.8,
            "genre": "Drama"
        }))
        .unwrap();
        assert_eq!(show.genre, vec!["Drama".to_string()]);
    }

    #[test]
    fn test_spanish_labels_are_accepted() {
        let show: Show = serde_json::from_value(json!({
            "id": 2,
            "title": "Goblin",
            "imageUrl": "https://img.example/g.jpg",
            "rating": 8.5,
            "language": "Español",
            "status": "En emisión",
            "episodes": 16,
            "genre": ["Fantasía", "Romance"]
        }))
        .unwrap();

        assert_eq!(show.language, Some(Language::Spanish));
        assert_eq!(show.air_status, Some(AirStatus::Airing));
        assert_eq!(show.episode_count, Some(16));
        assert_eq!(show.genre.len(), 2);
    }

    #[test]
    fn test_serializes_camel_case() {
        let mut show = Show::new(3u64, "Signal", "https://img.example/s.jpg", 8.0);
        show.air_status = Some(AirStatus::Finished);
        let value = serde_json::to_value(&show).unwrap();

        assert_eq!(value["imageUrl"], "https://img.example/s.jpg");
        assert_eq!(value["airStatus"], "finished");
        assert_eq!(value["isNew"], false);
        assert!(value.get("year").is_none());
    }
}
