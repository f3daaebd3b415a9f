//! DoS service records.

use std::fmt;

use crate::domain::{SpecifiedOpeningTime, StandardOpeningTimes, normalise_postcode, routing_key};

use super::RecordError;
use super::schema::{ColumnValue, ServiceRow};

/// Label used when a service has neither a public name nor a name.
pub const NO_VALID_NAME: &str = "NO-VALID-NAME";

/// Separator between address lines in the DoS `address` column.
pub const ADDRESS_SEPARATOR: char = '$';

/// One row of the DoS `services` table.
///
/// Opening times and the palliative-care flag live in other tables. They
/// start as `None` and are filled in by lookups when a comparison needs them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DosService {
    pub id: i64,
    pub uid: String,
    pub name: Option<String>,
    pub odscode: Option<String>,
    /// Lines joined with `$`.
    pub address: Option<String>,
    pub town: Option<String>,
    pub postcode: Option<String>,
    pub web: Option<String>,
    pub email: Option<String>,
    pub fax: Option<String>,
    pub nonpublicphone: Option<String>,
    pub typeid: i64,
    pub parentid: Option<i64>,
    pub subregionid: Option<i64>,
    pub statusid: i64,
    pub createdtime: Option<String>,
    pub modifiedtime: Option<String>,
    pub publicphone: Option<String>,
    pub publicname: Option<String>,

    pub standard_opening_times: Option<StandardOpeningTimes>,
    pub specified_opening_times: Option<Vec<SpecifiedOpeningTime>>,
    pub palliative_care: Option<bool>,
}

impl DosService {
    /// Build a service from a positional row in [`SERVICE_COLUMNS`](super::SERVICE_COLUMNS) order.
    pub fn from_row(values: &[ColumnValue]) -> Result<Self, RecordError> {
        let row = ServiceRow::new(values)?;
        // Non-nullable integer columns were checked by ServiceRow::new
        let id = row.integer("id").unwrap_or_default();
        let typeid = row.integer("typeid").unwrap_or_default();
        let statusid = row.integer("statusid").unwrap_or_default();

        Ok(Self {
            id,
            uid: row.text("uid").unwrap_or_default(),
            name: row.text("name"),
            odscode: row.text("odscode"),
            address: row.text("address"),
            town: row.text("town"),
            postcode: row.text("postcode"),
            web: row.text("web"),
            email: row.text("email"),
            fax: row.text("fax"),
            nonpublicphone: row.text("nonpublicphone"),
            typeid,
            parentid: row.integer("parentid"),
            subregionid: row.integer("subregionid"),
            statusid,
            createdtime: row.text("createdtime"),
            modifiedtime: row.text("modifiedtime"),
            publicphone: row.text("publicphone"),
            publicname: row.text("publicname"),
            standard_opening_times: None,
            specified_opening_times: None,
            palliative_care: None,
        })
    }

    /// A service with only identity, code and classification set.
    pub fn new(id: i64, odscode: &str, typeid: i64, statusid: i64) -> Self {
        Self {
            id,
            uid: id.to_string(),
            name: None,
            odscode: Some(odscode.to_string()),
            address: None,
            town: None,
            postcode: None,
            web: None,
            email: None,
            fax: None,
            nonpublicphone: None,
            typeid,
            parentid: None,
            subregionid: None,
            statusid,
            createdtime: None,
            modifiedtime: None,
            publicphone: None,
            publicname: None,
            standard_opening_times: None,
            specified_opening_times: None,
            palliative_care: None,
        }
    }

    /// Public name, else name, else [`NO_VALID_NAME`].
    pub fn label(&self) -> &str {
        [&self.publicname, &self.name]
            .into_iter()
            .flatten()
            .map(String::as_str)
            .find(|s| !s.trim().is_empty())
            .unwrap_or(NO_VALID_NAME)
    }

    /// First five characters of the ODS code, if it has that many.
    pub fn routing_key(&self) -> Option<&str> {
        self.odscode.as_deref().and_then(routing_key)
    }

    pub fn normal_postcode(&self) -> Option<String> {
        self.postcode.as_deref().map(normalise_postcode)
    }

    /// Non-blank address lines, in stored order.
    pub fn address_lines(&self) -> Vec<String> {
        self.address
            .as_deref()
            .unwrap_or_default()
            .split(ADDRESS_SEPARATOR)
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect()
    }
}

impl fmt::Display for DosService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<DoSService: name='{}' id={} uid={} odscode={} type={} status={}>",
            self.label(),
            self.id,
            self.uid,
            self.odscode.as_deref().unwrap_or_default(),
            self.typeid,
            self.statusid
        )
    }
}

/// Join address lines for storage.
pub fn join_address(lines: &[String]) -> String {
    lines.join(&ADDRESS_SEPARATOR.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dos::SERVICE_COLUMNS;

    fn row() -> Vec<ColumnValue> {
        use ColumnValue::{Integer, Null, Text};
        vec![
            Integer(1),
            Text("101".into()),
            Text("Test Pharmacy".into()),
            Text("FXX11001".into()),
            Text("1 High Street$Village".into()),
            Text("TOWN".into()),
            Text("TE5 7ER".into()),
            Text("www.test.com".into()),
            Null,
            Null,
            Null,
            Integer(13),
            Null,
            Integer(1000),
            Integer(1),
            Text("2011-09-08 10:31:08+01".into()),
            Null,
            Text("01234 567890".into()),
            Null,
        ]
    }

    #[test]
    fn from_row_maps_columns_by_position() {
        let service = DosService::from_row(&row()).unwrap();
        assert_eq!(service.id, 1);
        assert_eq!(service.uid, "101");
        assert_eq!(service.odscode.as_deref(), Some("FXX11001"));
        assert_eq!(service.typeid, 13);
        assert_eq!(service.subregionid, Some(1000));
        assert_eq!(service.statusid, 1);
        assert_eq!(service.publicphone.as_deref(), Some("01234 567890"));
        assert_eq!(service.publicname, None);
        assert_eq!(service.standard_opening_times, None);
    }

    #[test]
    fn from_row_rejects_wrong_arity() {
        let mut values = row();
        values.pop();
        assert_eq!(
            DosService::from_row(&values),
            Err(RecordError::Arity {
                expected: SERVICE_COLUMNS.len(),
                found: 18
            })
        );
    }

    #[test]
    fn from_row_rejects_wrong_kind() {
        let mut values = row();
        values[11] = ColumnValue::Text("13".into());
        assert!(matches!(
            DosService::from_row(&values),
            Err(RecordError::Kind {
                column: "typeid",
                ..
            })
        ));
    }

    #[test]
    fn from_row_rejects_null_identity() {
        let mut values = row();
        values[0] = ColumnValue::Null;
        assert_eq!(
            DosService::from_row(&values),
            Err(RecordError::Null { column: "id" })
        );
    }

    #[test]
    fn label_fallbacks() {
        let mut service = DosService::new(1, "FXX11", 13, 1);
        assert_eq!(service.label(), NO_VALID_NAME);

        service.name = Some("Name".into());
        assert_eq!(service.label(), "Name");

        service.publicname = Some("Public".into());
        assert_eq!(service.label(), "Public");

        service.publicname = Some("  ".into());
        assert_eq!(service.label(), "Name");
    }

    #[test]
    fn derived_fields() {
        let service = DosService::from_row(&row()).unwrap();
        assert_eq!(service.routing_key(), Some("FXX11"));
        assert_eq!(service.normal_postcode().as_deref(), Some("TE57ER"));
        assert_eq!(service.address_lines(), vec!["1 High Street", "Village"]);
        assert_eq!(
            service.to_string(),
            "<DoSService: name='Test Pharmacy' id=1 uid=101 odscode=FXX11001 type=13 status=1>"
        );

        let short = DosService::new(2, "FX1", 13, 1);
        assert_eq!(short.routing_key(), None);
    }

    #[test]
    fn join_and_split_address() {
        let lines = vec!["1 High Street".to_string(), "Village".to_string()];
        let mut service = DosService::new(1, "FXX11", 13, 1);
        service.address = Some(join_address(&lines));
        assert_eq!(service.address.as_deref(), Some("1 High Street$Village"));
        assert_eq!(service.address_lines(), lines);
    }
}
