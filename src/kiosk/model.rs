//! Core data types: module keys, organization groups and the record shapes
//! stored in each collection document.
//!
//! Records keep the on-disk field names of the portal (camelCase, and the
//! Turkish keys used by the FAQ and homepage documents) so existing data
//! files load unchanged. Fields the core does not interpret are carried in
//! `extra` and written back untouched.

use chrono::{Local, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use crate::error::{KioskError, Result};

/// The eleven organization groups shown on the org chart page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OrgGroup {
    Tb2Tb3,
    Akinci,
    Kizilelma,
    OnMontaj,
    KaliteKontrol,
    HafifPlatformlar,
    SurecYonetimi,
    Gelistirme,
    SurdurulebilirUretim,
    SahaOperasyonlari,
    IdariIsler,
}

impl OrgGroup {
    pub const ALL: [OrgGroup; 11] = [
        OrgGroup::Tb2Tb3,
        OrgGroup::Akinci,
        OrgGroup::Kizilelma,
        OrgGroup::OnMontaj,
        OrgGroup::KaliteKontrol,
        OrgGroup::HafifPlatformlar,
        OrgGroup::SurecYonetimi,
        OrgGroup::Gelistirme,
        OrgGroup::SurdurulebilirUretim,
        OrgGroup::SahaOperasyonlari,
        OrgGroup::IdariIsler,
    ];

    /// Key of the group's entry inside `organization_modules`.
    pub fn id(&self) -> &'static str {
        match self {
            OrgGroup::Tb2Tb3 => "tb2_tb3",
            OrgGroup::Akinci => "akinci",
            OrgGroup::Kizilelma => "kizilelma",
            OrgGroup::OnMontaj => "on_montaj",
            OrgGroup::KaliteKontrol => "kalite_kontrol",
            OrgGroup::HafifPlatformlar => "hafif_platformlar",
            OrgGroup::SurecYonetimi => "surec_yonetimi",
            OrgGroup::Gelistirme => "gelistirme",
            OrgGroup::SurdurulebilirUretim => "surdurulebilir_uretim",
            OrgGroup::SahaOperasyonlari => "saha_operasyonlari",
            OrgGroup::IdariIsler => "idari_isler",
        }
    }

    /// Key of the group inside the publish ledger.
    pub fn ledger_key(&self) -> &'static str {
        match self {
            OrgGroup::Tb2Tb3 => "TB2_TB3_Entegrasyon_Grubu",
            OrgGroup::Akinci => "Akinci_Entegrasyon_Grubu",
            OrgGroup::Kizilelma => "Kizilelma_Entegrasyon_Grubu",
            OrgGroup::OnMontaj => "On_Montaj_Grubu",
            OrgGroup::KaliteKontrol => "Kalite_Kontrol_Takimi",
            OrgGroup::HafifPlatformlar => "Hafif_Platformlar_Takimi",
            OrgGroup::SurecYonetimi => "Surec_Yonetimi_Takimi",
            OrgGroup::Gelistirme => "Gelistirme_Grubu",
            OrgGroup::SurdurulebilirUretim => "Surdurulebilir_Uretim_Takimi",
            OrgGroup::SahaOperasyonlari => "Saha_Operasyonlari_Ekibi",
            OrgGroup::IdariIsler => "Idari_Isler_Ekibi",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|g| g.id() == id)
    }
}

/// A key of the publish ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ModuleKey {
    Org(OrgGroup),
    Training,
    Faq,
    ProcessFlows,
    Procedures,
}

impl ModuleKey {
    /// Every known key, in ledger order.
    pub fn all() -> Vec<ModuleKey> {
        OrgGroup::ALL
            .into_iter()
            .map(ModuleKey::Org)
            .chain([
                ModuleKey::Training,
                ModuleKey::Faq,
                ModuleKey::ProcessFlows,
                ModuleKey::Procedures,
            ])
            .collect()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ModuleKey::Org(group) => group.ledger_key(),
            ModuleKey::Training => "EgitimModulu",
            ModuleKey::Faq => "SSSModulu",
            ModuleKey::ProcessFlows => "SurecAkislari",
            ModuleKey::Procedures => "ProsedurTalimatlar",
        }
    }

    /// Short name used on the command line.
    pub fn alias(&self) -> String {
        match self {
            ModuleKey::Org(group) => format!("org:{}", group.id()),
            ModuleKey::Training => "training".to_string(),
            ModuleKey::Faq => "faq".to_string(),
            ModuleKey::ProcessFlows => "flows".to_string(),
            ModuleKey::Procedures => "procedures".to_string(),
        }
    }
}

impl fmt::Display for ModuleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModuleKey {
    type Err = KioskError;

    /// Accepts the ledger key (`EgitimModulu`), the CLI alias (`training`,
    /// `org:akinci`) or a bare org group id (`akinci`).
    fn from_str(s: &str) -> Result<Self> {
        if let Some(key) = ModuleKey::all()
            .into_iter()
            .find(|k| k.as_str() == s || k.alias() == s)
        {
            return Ok(key);
        }
        let bare = s.strip_prefix("org:").unwrap_or(s);
        OrgGroup::from_id(bare)
            .map(ModuleKey::Org)
            .ok_or_else(|| KioskError::Api(format!("Unknown module: {}", s)))
    }
}

/// Records stored inside a list collection.
pub trait Record: Serialize + serde::de::DeserializeOwned + Clone {
    fn id(&self) -> &str;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingMaterial {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(rename = "type", default)]
    pub material_type: String,
    #[serde(default)]
    pub difficulty: String,
    #[serde(default)]
    pub content: String,
    pub upload_date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_url: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Record for TrainingMaterial {
    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Procedure {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(rename = "type", default)]
    pub procedure_type: String,
    #[serde(default)]
    pub content: String,
    pub upload_date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_url: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Record for Procedure {
    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessFlow {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Step list as parsed from the uploaded spreadsheet; layout is the
    /// renderer's business.
    #[serde(default)]
    pub steps: Vec<Value>,
    pub upload_date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Record for ProcessFlow {
    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FaqEntry {
    pub id: String,
    #[serde(rename = "Soru")]
    pub question: String,
    #[serde(rename = "Cevap")]
    pub answer: String,
    pub upload_date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Record for FaqEntry {
    fn id(&self) -> &str {
        &self.id
    }
}

/// One org group's uploaded chart, stored under the group id in
/// `organization_modules`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrgModuleData {
    #[serde(default)]
    pub tree_data: Value,
    #[serde(default)]
    pub stats: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upload_date: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A homepage news item or corporate value. These publish individually
/// through the inline flag, not through the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HomepageItem {
    pub id: String,
    #[serde(rename = "baslik")]
    pub title: String,
    #[serde(rename = "tarih")]
    pub date: String,
    #[serde(default)]
    pub is_published: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Record for HomepageItem {
    fn id(&self) -> &str {
        &self.id
    }
}

/// A fresh timestamp-derived record id.
pub fn new_record_id() -> String {
    Utc::now().timestamp_millis().to_string()
}

/// Today's date as stored in `uploadDate`.
pub fn upload_date_today() -> String {
    Local::now().format("%Y-%m-%d").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_all_keys_are_fifteen_and_unique() {
        let keys = ModuleKey::all();
        assert_eq!(keys.len(), 15);
        let mut names: Vec<_> = keys.iter().map(|k| k.as_str()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), 15);
    }

    #[test]
    fn test_module_key_parsing() {
        assert_eq!(
            "EgitimModulu".parse::<ModuleKey>().unwrap(),
            ModuleKey::Training
        );
        assert_eq!("faq".parse::<ModuleKey>().unwrap(), ModuleKey::Faq);
        assert_eq!(
            "org:akinci".parse::<ModuleKey>().unwrap(),
            ModuleKey::Org(OrgGroup::Akinci)
        );
        assert_eq!(
            "idari_isler".parse::<ModuleKey>().unwrap(),
            ModuleKey::Org(OrgGroup::IdariIsler)
        );
        assert!("nope".parse::<ModuleKey>().is_err());
    }

    #[test]
    fn test_faq_entry_uses_portal_field_names() {
        let raw = json!({
            "id": "1_0",
            "Soru": "Q?",
            "Cevap": "A.",
            "uploadDate": "2025-01-01",
            "fileName": "sss.xlsx"
        });
        let entry: FaqEntry = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(entry.question, "Q?");
        assert_eq!(serde_json::to_value(&entry).unwrap(), raw);
    }

    #[test]
    fn test_unknown_fields_survive_round_trip() {
        let raw = json!({
            "id": "5",
            "baslik": "News",
            "tarih": "2025-02-02",
            "isPublished": false,
            "kategori": "Duyuru",
            "haberGorseli": "news_5.png"
        });
        let item: HomepageItem = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(item.extra["haberGorseli"], "news_5.png");
        assert_eq!(serde_json::to_value(&item).unwrap(), raw);
    }
}
