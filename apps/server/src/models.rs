//! Response models

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PremiumOut {
    pub start: i64,
    pub finish: i64,
}

/// One account in a filter response; only projected fields are set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AccountOut {
    pub id: i32,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sex: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birth: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub joined: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub premium: Option<PremiumOut>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct AccountsOut {
    pub accounts: Vec<AccountOut>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unset_fields_are_omitted() {
        let account = AccountOut {
            id: 3,
            email: "a@b.ru".into(),
            city: Some("Москва".into()),
            premium: Some(PremiumOut {
                start: 1,
                finish: 2,
            }),
            ..AccountOut::default()
        };
        assert_eq!(
            serde_json::to_value(&account).unwrap(),
            json!({
                "id": 3,
                "email": "a@b.ru",
                "city": "Москва",
                "premium": {"start": 1, "finish": 2}
            })
        );
    }
}
