//! Fixed instruction prompt and response schema.
//!
//! Both are constants of the product: the user never edits them.

use serde_json::{Value, json};

use crate::Classification;

/// Sampling temperature: varied phrasing, but controlled.
pub const TEMPERATURE: f32 = 0.7;

/// Instruction sent alongside every image.
pub const INSTRUCTION: &str = r#"Analyze the face shape in this image strictly based on two categories:
1. "Eggen" (에겐): Smooth, round, oval, soft contours, baby-face characteristics.
2. "Teto" (테토): Sharp, angular, defined jawline, high cheekbones, square or diamond shape, chic vibes.

Provide the response in Korean. Be witty, fun, and helpful."#;

/// JSON schema the service must fill, in the service's schema dialect.
pub fn response_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "type": {
                "type": "STRING",
                "enum": [Classification::Eggen.as_str(), Classification::Teto.as_str()],
                "description": "The primary face shape classification. 'Eggen' for round/oval/smooth. 'Teto' for angular/square/sharp."
            },
            "percentage": {
                "type": "INTEGER",
                "description": "Confidence percentage of the classification (50-100)."
            },
            "title": {
                "type": "STRING",
                "description": "A fun, catchy title for the result in Korean (e.g., '매끈한 삶은 달걀', '각이 살아있는 조각상')."
            },
            "description": {
                "type": "STRING",
                "description": "A detailed analysis of the face shape features in Korean. Why is it Eggen or Teto?"
            },
            "stylingTips": {
                "type": "ARRAY",
                "items": { "type": "STRING" },
                "description": "3-4 hairstyle or accessory tips suitable for this face shape in Korean."
            },
            "celebrityLookalikes": {
                "type": "ARRAY",
                "items": { "type": "STRING" },
                "description": "Names of 2-3 celebrities with similar face shapes."
            }
        },
        "required": ["type", "percentage", "title", "description", "stylingTips", "celebrityLookalikes"]
    })
}
