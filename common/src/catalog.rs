//! テンプレートギャラリー
//!
//! 起動時に読み込まれ、以後変化しない6件の固定カタログ。

use crate::types::TemplateGarment;

/// (id, 表示名, アセットパス)
const TEMPLATE_TABLE: [(u32, &str, &str); 6] = [
    (1, "chaqueta.jpg", "assets/chaqueta1.jpg"),
    (2, "chaqueta2.jpg", "assets/chaqueta2.jpg"),
    (3, "dress1.jpg", "assets/dress1.jpg"),
    (4, "dress2.jpg", "assets/dress2.jpg"),
    (5, "dress_3.jpg", "assets/dress_3.jpg"),
    (6, "pants1.jpg", "assets/pants1.jpg"),
];

/// ギャラリーの全テンプレート（表示順）
pub fn templates() -> Vec<TemplateGarment> {
    TEMPLATE_TABLE
        .iter()
        .map(|(id, name, url)| TemplateGarment {
            id: *id,
            display_name: (*name).to_string(),
            asset_url: (*url).to_string(),
        })
        .collect()
}

/// IDでテンプレートを検索
pub fn find_template(id: u32) -> Option<TemplateGarment> {
    templates().into_iter().find(|t| t.id == id)
}
