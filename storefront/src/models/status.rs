// storefront/src/models/status.rs

use orderflow::model::Status;
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow)]
pub struct StatusRow {
  pub id: i32,
  pub name: String,
  pub label: String,
  pub color: Option<String>,
  pub icon: Option<String>,
  pub position: i32,
  pub active: bool,
}

impl From<StatusRow> for Status {
  fn from(row: StatusRow) -> Self {
    Status {
      id: row.id,
      name: row.name,
      label: row.label,
      color: row.color,
      icon: row.icon,
      position: row.position,
      active: row.active,
    }
  }
}
