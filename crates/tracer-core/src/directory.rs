//! Places and people: the records intervals take their snapshots from.

use std::future::Future;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  interval::{PlaceRef, SubjectRef},
  store::StoreError,
};

/// A physical location people check into.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Place {
  pub place_id:   Uuid,
  pub name:       String,
  pub created_at: DateTime<Utc>,
}

impl Place {
  pub fn to_ref(&self) -> PlaceRef {
    PlaceRef { place_id: self.place_id, name: self.name.clone() }
  }
}

/// A person whose presence is tracked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
  pub subject_id: Uuid,
  pub name:       String,
  pub email:      String,
  pub created_at: DateTime<Utc>,
}

impl Person {
  pub fn to_ref(&self) -> SubjectRef {
    SubjectRef { subject_id: self.subject_id, name: self.name.clone() }
  }
}

/// Input to [`Directory::add_person`].
#[derive(Debug, Clone, Deserialize)]
pub struct NewPerson {
  pub name:  String,
  pub email: String,
}

/// Input to [`Directory::update_person`]. Absent fields keep their value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PersonUpdate {
  pub name:  Option<String>,
  pub email: Option<String>,
}

/// Storage for places and people.
///
/// A conflict error from [`Directory::add_person`] or
/// [`Directory::update_person`] means the email address is already
/// registered. Updates and deletes never touch the name snapshots already
/// copied into intervals.
pub trait Directory: Send + Sync {
  type Error: StoreError;

  fn add_place(
    &self,
    name: String,
  ) -> impl Future<Output = Result<Place, Self::Error>> + Send + '_;

  fn get_place(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Place>, Self::Error>> + Send + '_;

  fn list_places(
    &self,
  ) -> impl Future<Output = Result<Vec<Place>, Self::Error>> + Send + '_;

  fn add_person(
    &self,
    input: NewPerson,
  ) -> impl Future<Output = Result<Person, Self::Error>> + Send + '_;

  fn get_person(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Person>, Self::Error>> + Send + '_;

  fn list_people(
    &self,
  ) -> impl Future<Output = Result<Vec<Person>, Self::Error>> + Send + '_;

  /// Rename a place. Returns `None` if it does not exist.
  fn update_place(
    &self,
    id: Uuid,
    name: String,
  ) -> impl Future<Output = Result<Option<Place>, Self::Error>> + Send + '_;

  /// Returns `false` if the place did not exist.
  fn delete_place(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Apply `update`. Returns `None` if the person does not exist.
  fn update_person(
    &self,
    id: Uuid,
    update: PersonUpdate,
  ) -> impl Future<Output = Result<Option<Person>, Self::Error>> + Send + '_;

  /// Returns `false` if the person did not exist.
  fn delete_person(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;
}
