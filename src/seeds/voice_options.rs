//! Voice catalogue seeding
//!
//! Inserts the default Swedish voices. Existing rows are left untouched so
//! catalogue edits made in the database survive reseeding.

use anyhow::Result;
use chrono::Utc;
use sea_orm::{DatabaseConnection, Set};

use crate::models::voice_option;
use crate::repositories::VoiceOptionRepository;

struct VoiceSeed {
    id: &'static str,
    name: &'static str,
    provider: &'static str,
    gender: &'static str,
    description: &'static str,
    is_default: bool,
}

const DEFAULT_VOICES: &[VoiceSeed] = &[
    VoiceSeed {
        id: "sv-SE-SofieNeural",
        name: "Sofie",
        provider: "azure",
        gender: "female",
        description: "Varm och tydlig, passar de flesta verksamheter",
        is_default: true,
    },
    VoiceSeed {
        id: "sv-SE-MattiasNeural",
        name: "Mattias",
        provider: "azure",
        gender: "male",
        description: "Lugn och saklig",
        is_default: false,
    },
    VoiceSeed {
        id: "sv-SE-HilleviNeural",
        name: "Hillevi",
        provider: "azure",
        gender: "female",
        description: "Energisk och vänlig",
        is_default: false,
    },
];

/// Seeds the voice catalogue. Returns the number of voices inserted.
pub async fn seed_voice_options(db: &DatabaseConnection) -> Result<usize> {
    let repo = VoiceOptionRepository::new(db);
    let mut inserted = 0;

    for (index, seed) in DEFAULT_VOICES.iter().enumerate() {
        if repo.find(seed.id).await?.is_some() {
            log::debug!("Voice '{}' already exists, skipping", seed.id);
            continue;
        }

        repo.create(voice_option::ActiveModel {
            id: Set(seed.id.to_string()),
            name: Set(seed.name.to_string()),
            provider: Set(seed.provider.to_string()),
            gender: Set(Some(seed.gender.to_string())),
            language: Set("sv-SE".to_string()),
            description: Set(Some(seed.description.to_string())),
            is_default: Set(seed.is_default),
            sort_order: Set(index as i32),
            created_at: Set(Utc::now().into()),
        })
        .await?;
        log::info!("Created voice option: {}", seed.id);
        inserted += 1;
    }

    Ok(inserted)
}
