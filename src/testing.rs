//! In-memory repositories backing `AppState::fake()`.

use std::cmp::Ordering;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::auth::repo::UserRepository;
use crate::auth::repo_types::{NewUser, ProfileUpdate, User};
use crate::auth::services::hash_password;
use crate::contacts::repo::ContactRepository;
use crate::contacts::repo_types::{Contact, ContactInput, ContactSortField};
use crate::pagination::{PageRequest, SortOrder};
use crate::registries::repo::RegistryRepository;
use crate::registries::repo_types::{Registry, RegistryInput, RegistrySortField};

#[derive(Clone, Default)]
pub struct Fakes {
    pub users: InMemoryUsers,
    pub contacts: InMemoryContacts,
    pub registries: InMemoryRegistries,
}

/// Sorts (when requested) and slices `rows` the way the SQL repositories do.
fn page_of<T, F: Copy>(
    mut rows: Vec<T>,
    page: &PageRequest<F>,
    cmp: impl Fn(&T, &T, F) -> Ordering,
) -> (Vec<T>, i64) {
    let total = rows.len() as i64;
    if let Some(sort) = page.sort {
        rows.sort_by(|a, b| {
            let ord = cmp(a, b, sort.field);
            match sort.order {
                SortOrder::Asc => ord,
                SortOrder::Desc => ord.reverse(),
            }
        });
    }
    let data = rows
        .into_iter()
        .skip(usize::try_from(page.offset()).unwrap_or(usize::MAX))
        .take(usize::try_from(page.limit()).unwrap_or(usize::MAX))
        .collect();
    (data, total)
}

#[derive(Clone, Default)]
pub struct InMemoryUsers {
    rows: Arc<Mutex<Vec<User>>>,
}

impl InMemoryUsers {
    pub fn seed(&self, email: &str, password: &str, is_active: bool) -> User {
        let user = User {
            id: Uuid::new_v4(),
            name: "usuario de teste".into(),
            email: email.into(),
            password_hash: hash_password(password).unwrap(),
            cellphone: "86988969872".into(),
            category: "CRIANÇAS".into(),
            is_active,
            created_at: OffsetDateTime::now_utc(),
        };
        self.rows.lock().unwrap().push(user.clone());
        user
    }
}

#[async_trait]
impl UserRepository for InMemoryUsers {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let rows = self.rows.lock().unwrap();
        Ok(rows.iter().find(|u| u.email == email).cloned())
    }

    async fn find_active_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let rows = self.rows.lock().unwrap();
        Ok(rows.iter().find(|u| u.email == email && u.is_active).cloned())
    }

    async fn find_active_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        let rows = self.rows.lock().unwrap();
        Ok(rows.iter().find(|u| u.id == id && u.is_active).cloned())
    }

    async fn create(&self, user: NewUser) -> anyhow::Result<User> {
        let mut rows = self.rows.lock().unwrap();
        anyhow::ensure!(!rows.iter().any(|u| u.email == user.email), "duplicate email");
        let user = User {
            id: Uuid::new_v4(),
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            cellphone: user.cellphone,
            category: user.category,
            is_active: true,
            created_at: OffsetDateTime::now_utc(),
        };
        rows.push(user.clone());
        Ok(user)
    }

    async fn update_profile(&self, id: Uuid, profile: ProfileUpdate) -> anyhow::Result<Option<User>> {
        let mut rows = self.rows.lock().unwrap();
        let Some(user) = rows.iter_mut().find(|u| u.id == id && u.is_active) else {
            return Ok(None);
        };
        user.name = profile.name;
        user.email = profile.email;
        user.cellphone = profile.cellphone;
        user.category = profile.category;
        Ok(Some(user.clone()))
    }

    async fn update_password(&self, id: Uuid, password_hash: &str) -> anyhow::Result<()> {
        let mut rows = self.rows.lock().unwrap();
        if let Some(user) = rows.iter_mut().find(|u| u.id == id) {
            user.password_hash = password_hash.to_string();
        }
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct InMemoryContacts {
    rows: Arc<Mutex<Vec<Contact>>>,
}

fn compare_contacts(a: &Contact, b: &Contact, field: ContactSortField) -> Ordering {
    match field {
        ContactSortField::Name => a.name.cmp(&b.name),
        ContactSortField::Cellphone => a.cellphone.cmp(&b.cellphone),
        ContactSortField::Category => a.category.cmp(&b.category),
        ContactSortField::CreatedAt => a.created_at.cmp(&b.created_at),
    }
}

#[async_trait]
impl ContactRepository for InMemoryContacts {
    async fn list(&self, page: &PageRequest<ContactSortField>) -> anyhow::Result<(Vec<Contact>, i64)> {
        let rows = self.rows.lock().unwrap().clone();
        Ok(page_of(rows, page, compare_contacts))
    }

    async fn find(&self, id: Uuid) -> anyhow::Result<Option<Contact>> {
        let rows = self.rows.lock().unwrap();
        Ok(rows.iter().find(|c| c.id == id).cloned())
    }

    async fn find_by_name_and_cellphone(
        &self,
        name: &str,
        cellphone: &str,
    ) -> anyhow::Result<Option<Contact>> {
        let rows = self.rows.lock().unwrap();
        Ok(rows
            .iter()
            .find(|c| c.name == name && c.cellphone == cellphone)
            .cloned())
    }

    async fn create(&self, input: ContactInput) -> anyhow::Result<Contact> {
        let contact = Contact {
            id: Uuid::new_v4(),
            name: input.name,
            cellphone: input.cellphone,
            category: input.category,
            created_at: OffsetDateTime::now_utc(),
        };
        self.rows.lock().unwrap().push(contact.clone());
        Ok(contact)
    }

    async fn update(&self, id: Uuid, input: ContactInput) -> anyhow::Result<Option<Contact>> {
        let mut rows = self.rows.lock().unwrap();
        let Some(contact) = rows.iter_mut().find(|c| c.id == id) else {
            return Ok(None);
        };
        contact.name = input.name;
        contact.cellphone = input.cellphone;
        contact.category = input.category;
        Ok(Some(contact.clone()))
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<Option<Contact>> {
        let mut rows = self.rows.lock().unwrap();
        let idx = rows.iter().position(|c| c.id == id);
        Ok(idx.map(|i| rows.remove(i)))
    }
}

#[derive(Clone, Default)]
pub struct InMemoryRegistries {
    rows: Arc<Mutex<Vec<Registry>>>,
}

fn compare_registries(a: &Registry, b: &Registry, field: RegistrySortField) -> Ordering {
    match field {
        RegistrySortField::CreatedAt => a.created_at.cmp(&b.created_at),
        RegistrySortField::Category => a.category.cmp(&b.category),
    }
}

#[async_trait]
impl RegistryRepository for InMemoryRegistries {
    async fn list_active(
        &self,
        page: &PageRequest<RegistrySortField>,
    ) -> anyhow::Result<(Vec<Registry>, i64)> {
        let rows: Vec<Registry> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.is_active)
            .cloned()
            .collect();
        Ok(page_of(rows, page, compare_registries))
    }

    async fn find(&self, id: Uuid) -> anyhow::Result<Option<Registry>> {
        let rows = self.rows.lock().unwrap();
        Ok(rows.iter().find(|r| r.id == id).cloned())
    }

    async fn find_active_by_category_and_date(
        &self,
        category: &str,
        date: Date,
    ) -> anyhow::Result<Option<Registry>> {
        let rows = self.rows.lock().unwrap();
        Ok(rows
            .iter()
            .find(|r| r.is_active && r.category == category && r.created_at == date)
            .cloned())
    }

    async fn create(&self, input: RegistryInput) -> anyhow::Result<Registry> {
        let registry = Registry {
            id: Uuid::new_v4(),
            created_at: input.created_at,
            category: input.category,
            is_active: true,
            contacts: input.contacts,
        };
        self.rows.lock().unwrap().push(registry.clone());
        Ok(registry)
    }

    async fn update(&self, id: Uuid, input: RegistryInput) -> anyhow::Result<Option<Registry>> {
        let mut rows = self.rows.lock().unwrap();
        let Some(registry) = rows.iter_mut().find(|r| r.id == id) else {
            return Ok(None);
        };
        registry.created_at = input.created_at;
        registry.category = input.category;
        registry.contacts = input.contacts;
        Ok(Some(registry.clone()))
    }

    async fn deactivate(&self, id: Uuid) -> anyhow::Result<Option<Registry>> {
        let mut rows = self.rows.lock().unwrap();
        let Some(registry) = rows.iter_mut().find(|r| r.id == id) else {
            return Ok(None);
        };
        registry.is_active = false;
        Ok(Some(registry.clone()))
    }
}
