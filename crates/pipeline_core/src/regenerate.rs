use serde::{Serialize, Serializer};

use crate::{Post, PostKind};

pub const TEXT_VARIANT_RATE: f64 = 0.002;
pub const VIDEO_VARIANT_RATE: f64 = 0.067;
pub const NEW_TEXT_POST_COST: f64 = 0.30;
pub const NEW_VIDEO_POST_COST: f64 = 0.40;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VariantCount {
    One,
    #[default]
    Three,
    Five,
}

impl VariantCount {
    pub fn get(self) -> u32 {
        match self {
            VariantCount::One => 1,
            VariantCount::Three => 3,
            VariantCount::Five => 5,
        }
    }

    pub fn from_count(count: u32) -> Option<Self> {
        match count {
            1 => Some(VariantCount::One),
            3 => Some(VariantCount::Three),
            5 => Some(VariantCount::Five),
            _ => None,
        }
    }
}

impl Serialize for VariantCount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u32(self.get())
    }
}

/// Body of a regenerate request.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegenerateOptions {
    pub variant_count: VariantCount,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_instructions: Option<String>,
    pub change_hook_style: bool,
    pub change_tone: bool,
}

impl RegenerateOptions {
    /// Blank instructions are treated as absent.
    pub fn with_instructions(mut self, instructions: &str) -> Self {
        let trimmed = instructions.trim();
        self.custom_instructions = (!trimmed.is_empty()).then(|| trimmed.to_string());
        self
    }
}

/// Display-only cost estimate; the backend records the real spend.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostQuote {
    pub per_variant: f64,
    pub variants: u32,
    pub total: f64,
    pub new_content_cost: f64,
    pub savings_percent: i64,
}

pub fn quote(kind: PostKind, variants: VariantCount) -> CostQuote {
    let (per_variant, new_content_cost) = match kind {
        PostKind::Text => (TEXT_VARIANT_RATE, NEW_TEXT_POST_COST),
        PostKind::Video => (VIDEO_VARIANT_RATE, NEW_VIDEO_POST_COST),
    };
    let total = per_variant * f64::from(variants.get());
    let savings_percent = ((1.0 - total / new_content_cost) * 100.0).round() as i64;
    CostQuote {
        per_variant,
        variants: variants.get(),
        total,
        new_content_cost,
        savings_percent,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RegenerationAnomaly {
    CountNotAdvanced { before: u32, after: u32 },
    CostDecreased { before: f64, after: f64 },
    KindChanged { before: PostKind, after: PostKind },
}

/// Compares a post before and after a successful regenerate.
pub fn check_regeneration(before: &Post, after: &Post) -> Vec<RegenerationAnomaly> {
    let mut anomalies = Vec::new();
    if after.regeneration_count != before.regeneration_count + 1 {
        anomalies.push(RegenerationAnomaly::CountNotAdvanced {
            before: before.regeneration_count,
            after: after.regeneration_count,
        });
    }
    if after.total_cost < before.total_cost {
        anomalies.push(RegenerationAnomaly::CostDecreased {
            before: before.total_cost,
            after: after.total_cost,
        });
    }
    if after.kind != before.kind {
        anomalies.push(RegenerationAnomaly::KindChanged {
            before: before.kind,
            after: after.kind,
        });
    }
    anomalies
}
