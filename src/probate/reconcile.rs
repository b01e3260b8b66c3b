//! ページごとの FieldMap を1事件のレコードにまとめる
//!
//! 同じ見出し（City など）がページによって別の意味を持つので、マージ前にページ単位で
//! キーを付け替える。後から曖昧さを解消することはしない。

use tracing::debug;

use super::pages::PageKind;
use super::types::{CanonicalRecord, FieldMap};

/// ページごとのキー付け替え規則
#[derive(Debug, Clone, Copy)]
pub enum KeyRule {
    /// 指定の見出しだけ名前を変える
    Rename(&'static [(&'static str, &'static str)]),
    /// すべての見出しに接頭辞を付ける
    Prefix(&'static str),
    /// そのまま
    Keep,
}

/// 詳細ページの住所は故人の物件住所（追加詳細ページの同名項目は郵送先）
pub const PRIMARY_RENAMES: &[(&str, &str)] = &[
    ("City", "Property City"),
    ("State", "Property State"),
    ("Zip", "Property Zip"),
];

pub const ATTORNEY_PREFIX: &str = "Attorney_";

/// マージ順に並べたページと規則
pub const PAGE_RULES: &[(PageKind, KeyRule)] = &[
    (PageKind::PrimaryDetail, KeyRule::Rename(PRIMARY_RENAMES)),
    (PageKind::AdditionalDetail, KeyRule::Keep),
    (PageKind::Attorney, KeyRule::Prefix(ATTORNEY_PREFIX)),
    // 取得時に Fiduciary_<i>_ 付きで平坦化済み
    (PageKind::FiduciaryRoster, KeyRule::Keep),
];

impl KeyRule {
    pub fn apply(self, mut fields: FieldMap) -> FieldMap {
        match self {
            Self::Rename(pairs) => {
                for (from, to) in pairs {
                    if let Some(value) = fields.remove(*from) {
                        fields.insert((*to).to_string(), value);
                    }
                }
                fields
            }
            Self::Prefix(prefix) => fields
                .into_iter()
                .map(|(k, v)| (format!("{}{}", prefix, k), v))
                .collect(),
            Self::Keep => fields,
        }
    }
}

pub fn rule_for(kind: PageKind) -> KeyRule {
    PAGE_RULES
        .iter()
        .find(|(k, _)| *k == kind)
        .map(|(_, rule)| *rule)
        .unwrap_or(KeyRule::Keep)
}

/// 詳細ページの見出し付け替えだけを行う
pub fn rename_primary(fields: FieldMap) -> FieldMap {
    rule_for(PageKind::PrimaryDetail).apply(fields)
}

/// 事件1件分のページをマージする
///
/// 先に入ったキーは後のページで上書きしない（詳細ページの値が優先）。
/// 取れなかった補助ページは None で渡す。
pub fn merge(
    primary: FieldMap,
    additional: Option<FieldMap>,
    attorney: Option<FieldMap>,
    roster: Option<FieldMap>,
) -> CanonicalRecord {
    let mut record = CanonicalRecord::new();
    let (mut primary, mut additional, mut attorney, mut roster) =
        (Some(primary), additional, attorney, roster);

    for (kind, rule) in PAGE_RULES {
        let fields = match kind {
            PageKind::PrimaryDetail => primary.take(),
            PageKind::AdditionalDetail => additional.take(),
            PageKind::Attorney => attorney.take(),
            PageKind::FiduciaryRoster => roster.take(),
            PageKind::Listing => None,
        };
        let Some(fields) = fields else { continue };

        for (key, value) in rule.apply(fields) {
            if record.contains_key(&key) {
                debug!("'{}' は先の値を優先 ({} の重複を破棄)", key, kind.label());
                continue;
            }
            record.insert(key, value);
        }
    }

    record
}
