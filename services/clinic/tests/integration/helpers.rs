use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::{Arc, Mutex};

use chrono::{NaiveDate, NaiveTime};

use clinic::domain::guard::Principal;
use clinic::domain::repository::{
    AccessRepository, PasswordHasher, PatientRepository, ReservationRepository,
    SpreadsheetReader, TokenRepository, UserRepository,
};
use clinic::domain::types::{
    Credentials, ImportRow, NewUser, Patient, PatientFields, PatientFilter, Reservation,
    ReservationFields, ReservationFilter, Role, User, UserChanges, UserFilter,
};
use clinic::error::ClinicServiceError;
use clinic_auth_types::token::TokenKey;
use clinic_domain::group::Group;
use clinic_domain::permission::{Permission, Resource};
use clinic_domain::role::{RoleKind, group_for_role};

// ── Store ────────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct StoreData {
    pub roles: Vec<Role>,
    pub groups: BTreeSet<Group>,
    pub grants: BTreeSet<(Group, Permission)>,
    pub users: Vec<(User, String)>,
    pub memberships: HashMap<i32, Vec<Group>>,
    pub patients: Vec<Patient>,
    pub reservations: Vec<Reservation>,
    pub tokens: HashMap<i32, TokenKey>,
    /// Simulates a concurrent delete landing between a read and its update.
    pub delete_before_update: bool,
    next_id: i32,
}

impl StoreData {
    fn next_id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }
}

/// In-memory stand-in for every repository. Clones share the same data.
#[derive(Clone, Default)]
pub struct Store {
    pub data: Arc<Mutex<StoreData>>,
}

impl Store {
    /// Store holding the three standard roles and groups.
    pub fn seeded() -> Self {
        let store = Self::default();
        {
            let mut data = store.data.lock().unwrap();
            for kind in RoleKind::ALL {
                let id = data.next_id();
                data.roles.push(Role {
                    id,
                    name: kind.name().to_owned(),
                });
            }
            data.groups.extend(Group::ALL);
        }
        store
    }

    pub fn role(&self, kind: RoleKind) -> Role {
        let data = self.data.lock().unwrap();
        data.roles
            .iter()
            .find(|r| r.name == kind.name())
            .cloned()
            .unwrap()
    }

    /// Insert a staff member directly, enrolled in the group of its role.
    pub fn add_user(&self, email: &str, kind: RoleKind) -> User {
        let role = self.role(kind);
        let mut data = self.data.lock().unwrap();
        let id = data.next_id();
        let user = User {
            id,
            email: email.to_owned(),
            name: email.to_owned(),
            is_active: true,
            is_staff: false,
            is_superuser: false,
            role,
            address: None,
            phone_number: None,
        };
        data.users.push((user.clone(), hash_of("password")));
        data.memberships.insert(id, vec![kind.group()]);
        user
    }

    pub fn add_patient(&self, name: &str) -> Patient {
        let mut data = self.data.lock().unwrap();
        let id = data.next_id();
        let patient = Patient {
            id,
            name: name.to_owned(),
            relative: None,
            relative_name: None,
            phone_number: "0123456789".to_owned(),
            birth_date: date(2015, 7, 23),
        };
        data.patients.push(patient.clone());
        patient
    }

    pub fn add_reservation(&self, patient_id: i32, doctor_id: i32, on: NaiveDate) -> Reservation {
        let mut data = self.data.lock().unwrap();
        let id = data.next_id();
        let reservation = Reservation {
            id,
            patient_id,
            doctor_id,
            date: on,
            time: time(15, 0),
            description: "checkup".to_owned(),
            requirements: None,
            patient_reminder: None,
            doctor_reminder: None,
        };
        data.reservations.push(reservation.clone());
        reservation
    }

    pub fn groups_of(&self, user_id: i32) -> Vec<Group> {
        let data = self.data.lock().unwrap();
        data.memberships.get(&user_id).cloned().unwrap_or_default()
    }

    pub fn user_count(&self) -> usize {
        self.data.lock().unwrap().users.len()
    }

    pub fn patients(&self) -> Vec<Patient> {
        self.data.lock().unwrap().patients.clone()
    }

    pub fn reservations(&self) -> Vec<Reservation> {
        self.data.lock().unwrap().reservations.clone()
    }
}

impl AccessRepository for Store {
    async fn find_role(&self, id: i32) -> Result<Option<Role>, ClinicServiceError> {
        let data = self.data.lock().unwrap();
        Ok(data.roles.iter().find(|r| r.id == id).cloned())
    }

    async fn ensure_role(&self, name: &str) -> Result<(Role, bool), ClinicServiceError> {
        let mut data = self.data.lock().unwrap();
        if let Some(role) = data.roles.iter().find(|r| r.name == name) {
            return Ok((role.clone(), false));
        }
        let id = data.next_id();
        let role = Role {
            id,
            name: name.to_owned(),
        };
        data.roles.push(role.clone());
        Ok((role, true))
    }

    async fn ensure_group(&self, group: Group) -> Result<bool, ClinicServiceError> {
        Ok(self.data.lock().unwrap().groups.insert(group))
    }

    async fn permissions_for(
        &self,
        resource: Resource,
    ) -> Result<Vec<Permission>, ClinicServiceError> {
        Ok(Permission::for_resource(resource))
    }

    async fn grant(
        &self,
        group: Group,
        permission: Permission,
    ) -> Result<bool, ClinicServiceError> {
        Ok(self.data.lock().unwrap().grants.insert((group, permission)))
    }
}

impl UserRepository for Store {
    async fn list(&self, filter: &UserFilter) -> Result<Vec<User>, ClinicServiceError> {
        let data = self.data.lock().unwrap();
        Ok(data
            .users
            .iter()
            .map(|(u, _)| u.clone())
            .filter(|u| filter.role.as_ref().is_none_or(|r| &u.role.name == r))
            .filter(|u| filter.name.as_ref().is_none_or(|n| u.name.starts_with(n.as_str())))
            .collect())
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<User>, ClinicServiceError> {
        let data = self.data.lock().unwrap();
        Ok(data.users.iter().find(|(u, _)| u.id == id).map(|(u, _)| u.clone()))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, ClinicServiceError> {
        let data = self.data.lock().unwrap();
        Ok(data
            .users
            .iter()
            .find(|(u, _)| u.email == email)
            .map(|(u, _)| u.clone()))
    }

    async fn credentials(&self, email: &str) -> Result<Option<Credentials>, ClinicServiceError> {
        let data = self.data.lock().unwrap();
        Ok(data
            .users
            .iter()
            .find(|(u, _)| u.email == email)
            .map(|(u, hash)| Credentials {
                user_id: u.id,
                password_hash: hash.clone(),
                is_active: u.is_active,
            }))
    }

    async fn create(&self, user: &NewUser, group: Group) -> Result<User, ClinicServiceError> {
        let mut data = self.data.lock().unwrap();
        let id = data.next_id();
        let created = User {
            id,
            email: user.email.clone(),
            name: user.name.clone(),
            is_active: true,
            is_staff: user.is_staff,
            is_superuser: user.is_superuser,
            role: user.role.clone(),
            address: user.address.clone(),
            phone_number: user.phone_number.clone(),
        };
        data.users.push((created.clone(), user.password_hash.clone()));
        data.memberships.insert(id, vec![group]);
        Ok(created)
    }

    async fn update(
        &self,
        id: i32,
        changes: &UserChanges,
        group: Option<Group>,
    ) -> Result<Option<User>, ClinicServiceError> {
        let mut data = self.data.lock().unwrap();
        let Some((user, hash)) = data.users.iter_mut().find(|(u, _)| u.id == id) else {
            return Ok(None);
        };
        if let Some(ref email) = changes.email {
            user.email = email.clone();
        }
        if let Some(ref name) = changes.name {
            user.name = name.clone();
        }
        if let Some(ref password_hash) = changes.password_hash {
            *hash = password_hash.clone();
        }
        if let Some(ref role) = changes.role {
            user.role = role.clone();
        }
        if let Some(ref address) = changes.address {
            user.address = address.clone();
        }
        if let Some(ref phone_number) = changes.phone_number {
            user.phone_number = phone_number.clone();
        }
        let updated = user.clone();
        if let Some(group) = group {
            data.memberships.insert(id, vec![group]);
        }
        Ok(Some(updated))
    }

    async fn delete(&self, id: i32) -> Result<bool, ClinicServiceError> {
        let mut data = self.data.lock().unwrap();
        let before = data.users.len();
        data.users.retain(|(u, _)| u.id != id);
        data.memberships.remove(&id);
        data.tokens.remove(&id);
        data.reservations.retain(|r| r.doctor_id != id);
        Ok(data.users.len() < before)
    }
}

impl PatientRepository for Store {
    async fn list(&self, filter: &PatientFilter) -> Result<Vec<Patient>, ClinicServiceError> {
        let data = self.data.lock().unwrap();
        Ok(data
            .patients
            .iter()
            .filter(|p| filter.name.as_ref().is_none_or(|n| p.name.starts_with(n.as_str())))
            .cloned()
            .collect())
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<Patient>, ClinicServiceError> {
        let data = self.data.lock().unwrap();
        Ok(data.patients.iter().find(|p| p.id == id).cloned())
    }

    async fn create(&self, fields: &PatientFields) -> Result<Patient, ClinicServiceError> {
        let mut data = self.data.lock().unwrap();
        let id = data.next_id();
        let patient = fields.clone().into_patient(id);
        data.patients.push(patient.clone());
        Ok(patient)
    }

    async fn update(&self, patient: &Patient) -> Result<bool, ClinicServiceError> {
        let mut data = self.data.lock().unwrap();
        if data.delete_before_update {
            data.patients.retain(|p| p.id != patient.id);
        }
        let Some(existing) = data.patients.iter_mut().find(|p| p.id == patient.id) else {
            return Ok(false);
        };
        *existing = patient.clone();
        Ok(true)
    }

    async fn delete(&self, id: i32) -> Result<bool, ClinicServiceError> {
        let mut data = self.data.lock().unwrap();
        let before = data.patients.len();
        data.patients.retain(|p| p.id != id);
        data.reservations.retain(|r| r.patient_id != id);
        Ok(data.patients.len() < before)
    }

    async fn existing_names(
        &self,
        names: &[String],
    ) -> Result<HashSet<String>, ClinicServiceError> {
        let data = self.data.lock().unwrap();
        Ok(data
            .patients
            .iter()
            .filter(|p| names.contains(&p.name))
            .map(|p| p.name.clone())
            .collect())
    }

    async fn create_many(&self, rows: &[PatientFields]) -> Result<u64, ClinicServiceError> {
        let mut data = self.data.lock().unwrap();
        for fields in rows {
            let id = data.next_id();
            data.patients.push(fields.clone().into_patient(id));
        }
        Ok(rows.len() as u64)
    }
}

impl ReservationRepository for Store {
    async fn list(
        &self,
        filter: &ReservationFilter,
    ) -> Result<Vec<Reservation>, ClinicServiceError> {
        let data = self.data.lock().unwrap();
        Ok(data
            .reservations
            .iter()
            .filter(|r| r.date == filter.date)
            .filter(|r| filter.doctor_id.is_none_or(|d| r.doctor_id == d))
            .cloned()
            .collect())
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<Reservation>, ClinicServiceError> {
        let data = self.data.lock().unwrap();
        Ok(data.reservations.iter().find(|r| r.id == id).cloned())
    }

    async fn create(&self, fields: &ReservationFields) -> Result<Reservation, ClinicServiceError> {
        let mut data = self.data.lock().unwrap();
        let id = data.next_id();
        let reservation = fields.clone().into_reservation(id);
        data.reservations.push(reservation.clone());
        Ok(reservation)
    }

    async fn update(&self, reservation: &Reservation) -> Result<bool, ClinicServiceError> {
        let mut data = self.data.lock().unwrap();
        if data.delete_before_update {
            data.reservations.retain(|r| r.id != reservation.id);
        }
        let Some(existing) = data.reservations.iter_mut().find(|r| r.id == reservation.id) else {
            return Ok(false);
        };
        *existing = reservation.clone();
        Ok(true)
    }

    async fn delete(&self, id: i32) -> Result<bool, ClinicServiceError> {
        let mut data = self.data.lock().unwrap();
        let before = data.reservations.len();
        data.reservations.retain(|r| r.id != id);
        Ok(data.reservations.len() < before)
    }
}

impl TokenRepository for Store {
    async fn get_or_create(
        &self,
        user_id: i32,
        candidate: &TokenKey,
    ) -> Result<TokenKey, ClinicServiceError> {
        let mut data = self.data.lock().unwrap();
        Ok(data
            .tokens
            .entry(user_id)
            .or_insert_with(|| candidate.clone())
            .clone())
    }

    async fn principal(&self, key: &TokenKey) -> Result<Option<Principal>, ClinicServiceError> {
        let data = self.data.lock().unwrap();
        let Some(user_id) = data
            .tokens
            .iter()
            .find(|(_, k)| *k == key)
            .map(|(id, _)| *id)
        else {
            return Ok(None);
        };
        let Some((user, _)) = data.users.iter().find(|(u, _)| u.id == user_id) else {
            return Ok(None);
        };
        if !user.is_active {
            return Ok(None);
        }
        let groups = data.memberships.get(&user_id).cloned().unwrap_or_default();
        Ok(Some(principal_for(user, &groups)))
    }
}

// ── Principals ───────────────────────────────────────────────────────────────

/// A caller whose permissions follow the policy table for `groups`.
pub fn principal_for(user: &User, groups: &[Group]) -> Principal {
    let catalog = Permission::catalog();
    let permissions = groups
        .iter()
        .flat_map(|g| g.select(&catalog))
        .collect::<BTreeSet<_>>();
    Principal {
        user_id: user.id,
        permissions,
    }
}

/// A staff member with `kind`'s role and group, stored in `store`.
pub fn staff(store: &Store, email: &str, kind: RoleKind) -> (User, Principal) {
    let user = store.add_user(email, kind);
    let principal = principal_for(&user, &[group_for_role(&user.role.name)]);
    (user, principal)
}

/// Authenticated, but in no group.
pub fn nobody() -> Principal {
    Principal {
        user_id: 999,
        permissions: BTreeSet::new(),
    }
}

// ── PlainHasher ──────────────────────────────────────────────────────────────

pub fn hash_of(password: &str) -> String {
    format!("hashed:{password}")
}

pub struct PlainHasher;

impl PasswordHasher for PlainHasher {
    async fn hash(&self, password: &str) -> Result<String, ClinicServiceError> {
        Ok(hash_of(password))
    }

    async fn verify(&self, password: &str, hash: &str) -> Result<bool, ClinicServiceError> {
        Ok(hash_of(password) == hash)
    }
}

// ── MockReader ───────────────────────────────────────────────────────────────

/// Returns canned rows regardless of the uploaded bytes.
pub struct MockReader {
    pub rows: Vec<ImportRow>,
}

impl SpreadsheetReader for MockReader {
    fn read_rows(&self, _bytes: &[u8]) -> Result<Vec<ImportRow>, ClinicServiceError> {
        Ok(self.rows.clone())
    }
}

// ── Values ───────────────────────────────────────────────────────────────────

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn time(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}
