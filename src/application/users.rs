//! User application service.

use std::sync::Arc;

use sha2::{Digest, Sha256};

use crate::application::repos::{
    CreateUserParams, ListUsersParams, RepoError, UpdateUserParams, UsersRepo,
};
use crate::domain::entities::UserRecord;

pub struct UserService {
    repo: Arc<dyn UsersRepo>,
}

#[derive(Debug, Clone)]
pub struct RegisterUserParams {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
}

impl UserService {
    pub fn new(repo: Arc<dyn UsersRepo>) -> Self {
        Self { repo }
    }

    /// Hash the supplied password and persist the user.
    pub async fn register_user(&self, params: RegisterUserParams) -> Result<UserRecord, RepoError> {
        let hashed_password = Self::hash_password(&params.password);
        self.repo
            .create_user(CreateUserParams {
                first_name: params.first_name,
                last_name: params.last_name,
                email: params.email,
                hashed_password,
            })
            .await
    }

    pub async fn get_user_by_id(&self, id: i64) -> Result<UserRecord, RepoError> {
        self.repo.get_user_by_id(id).await
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<UserRecord, RepoError> {
        self.repo.get_user_by_email(email).await
    }

    pub async fn list_users(&self, params: ListUsersParams) -> Result<Vec<UserRecord>, RepoError> {
        self.repo.list_users(params).await
    }

    pub async fn update_user(&self, params: UpdateUserParams) -> Result<UserRecord, RepoError> {
        self.repo.update_user(params).await
    }

    pub async fn delete_user(&self, id: i64) -> Result<(), RepoError> {
        self.repo.delete_user(id).await
    }

    fn hash_password(password: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(password.as_bytes());
        let digest = hasher.finalize();
        let mut out = String::with_capacity(digest.len() * 2);
        for byte in digest {
            out.push_str(&format!("{byte:02x}"));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_hash_is_stable_hex() {
        let a = UserService::hash_password("password123");
        let b = UserService::hash_password("password123");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));

        let other = UserService::hash_password("different");
        assert_ne!(a, other);
    }
}
