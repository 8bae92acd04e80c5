//! 衣服IDの解決
//!
//! 明示的なIDを優先し、無い場合に限り表示名の最初の整数を使う。
//! どちらも取れない参照は送信前に拒否する（別の衣服で処理されるのを防ぐ）。

use crate::error::{Error, Result};
use crate::types::{GarmentDescriptor, TemplateGarment};
use regex::Regex;

lazy_static::lazy_static! {
    static ref FIRST_NUMBER_RE: Regex = Regex::new(r"(\d+)").unwrap();
}

/// 衣服として送信できるもの
pub trait GarmentRef {
    fn explicit_id(&self) -> Option<u32>;
    fn label(&self) -> &str;

    /// `clothe_id` フィールドに入れる値
    fn clothe_id(&self) -> Result<u32> {
        resolve_clothe_id(self.explicit_id(), self.label())
    }
}

impl GarmentRef for TemplateGarment {
    fn explicit_id(&self) -> Option<u32> {
        Some(self.id)
    }

    fn label(&self) -> &str {
        &self.display_name
    }
}

impl GarmentRef for GarmentDescriptor {
    fn explicit_id(&self) -> Option<u32> {
        self.id
    }

    fn label(&self) -> &str {
        &self.name
    }
}

/// IDを決定する
///
/// # Arguments
/// * `id` - カタログ上の明示的なID
/// * `name` - 表示名（"clothe_1.jpg", "1_shirt.png" など）
pub fn resolve_clothe_id(id: Option<u32>, name: &str) -> Result<u32> {
    if let Some(id) = id {
        return Ok(id);
    }

    let parsed = FIRST_NUMBER_RE
        .captures(name)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<u32>().ok());

    match parsed {
        Some(id) => {
            log::warn!("garment '{}' has no explicit id, using {} from its name", name, id);
            Ok(id)
        }
        None => Err(Error::UnresolvedGarment(name.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_id_wins() {
        assert_eq!(resolve_clothe_id(Some(5), "dress_3.jpg").unwrap(), 5);
    }

    #[test]
    fn test_fallback_to_first_number() {
        assert_eq!(resolve_clothe_id(None, "clothe_12.jpg").unwrap(), 12);
        assert_eq!(resolve_clothe_id(None, "3_shirt_v2.png").unwrap(), 3);
    }

    #[test]
    fn test_unparseable_name_fails_closed() {
        let err = resolve_clothe_id(None, "chaqueta.jpg").unwrap_err();
        assert!(matches!(err, Error::UnresolvedGarment(ref n) if n == "chaqueta.jpg"));
    }

    #[test]
    fn test_overflowing_number_fails_closed() {
        let err = resolve_clothe_id(None, "item_99999999999999.jpg").unwrap_err();
        assert!(matches!(err, Error::UnresolvedGarment(_)));
    }

    #[test]
    fn test_template_uses_its_id_not_its_name() {
        let template = crate::catalog::find_template(1).unwrap();
        assert_eq!(template.clothe_id().unwrap(), 1);

        let odd = TemplateGarment {
            id: 6,
            display_name: "dress2.jpg".into(),
            asset_url: String::new(),
        };
        assert_eq!(odd.clothe_id().unwrap(), 6);
    }

    #[test]
    fn test_descriptor_without_id_uses_name() {
        let descriptor = GarmentDescriptor {
            name: "pants1.jpg".into(),
            ..Default::default()
        };
        assert_eq!(descriptor.clothe_id().unwrap(), 1);
    }
}
