use std::sync::Arc;

use tracing::{debug, info, instrument};
use uuid::Uuid;

use shared_database::{BookingStore, StoreError};
use shared_models::actor::Actor;
use shared_models::booking::{Audit, Role, User};

use crate::models::{CreateUserRequest, UpdateUserRequest, UserError};
use crate::services::password::PasswordService;

pub struct UserService {
    store: Arc<dyn BookingStore>,
}

impl UserService {
    pub fn new(store: Arc<dyn BookingStore>) -> Self {
        Self { store }
    }

    #[instrument(skip(self, request, actor), fields(email = %request.email))]
    pub async fn create_user(&self, request: CreateUserRequest, actor: &Actor) -> Result<User, UserError> {
        info!("Creating user with email: {}", request.email);

        if self.store.user_email_exists(&request.email).await? {
            return Err(UserError::EmailTaken(request.email));
        }

        let email = request.email.clone();
        let user = User {
            id: Uuid::new_v4(),
            email: request.email,
            password_hash: PasswordService::hash_password(&request.password)?,
            firstname: request.firstname,
            lastname: request.lastname,
            phone: request.phone,
            roles: vec![Role::User],
            enabled: true,
            audit: Audit::new(actor),
        };

        let saved = self.store.insert_user(user).await.map_err(|e| match e {
            StoreError::UniqueViolation(_) => UserError::EmailTaken(email),
            other => other.into(),
        })?;
        info!("User created successfully with id: {}", saved.id);
        Ok(saved)
    }

    pub async fn get_user(&self, id: Uuid) -> Result<User, UserError> {
        debug!("Fetching user with id: {}", id);
        self.store.find_user(id).await?.ok_or(UserError::NotFound(id))
    }

    pub async fn list_users(&self) -> Result<Vec<User>, UserError> {
        debug!("Fetching all users");
        Ok(self.store.list_users().await?)
    }

    pub async fn update_user(
        &self,
        id: Uuid,
        request: UpdateUserRequest,
        actor: &Actor,
    ) -> Result<User, UserError> {
        info!("Updating user with id: {}", id);
        let mut user = self.get_user(id).await?;

        if user.email != request.email && self.store.user_email_exists(&request.email).await? {
            return Err(UserError::EmailTakenByOther(request.email));
        }

        user.email = request.email;
        user.firstname = request.firstname;
        user.lastname = request.lastname;
        user.phone = request.phone;
        user.audit.touch(actor);

        let updated = self.store.update_user(user).await?;
        info!("User updated successfully with id: {}", updated.id);
        Ok(updated)
    }

    pub async fn delete_user(&self, id: Uuid) -> Result<(), UserError> {
        info!("Deleting user with id: {}", id);
        if !self.store.user_exists(id).await? {
            return Err(UserError::NotFound(id));
        }
        self.store.delete_user(id).await?;
        info!("User deleted successfully with id: {}", id);
        Ok(())
    }

    #[instrument(skip(self, current_password, new_password, actor))]
    pub async fn change_password(
        &self,
        id: Uuid,
        current_password: &str,
        new_password: &str,
        actor: &Actor,
    ) -> Result<(), UserError> {
        info!("Changing password for user with id: {}", id);
        let mut user = self.get_user(id).await?;

        if !PasswordService::verify_password(current_password, &user.password_hash)? {
            return Err(UserError::IncorrectPassword);
        }

        user.password_hash = PasswordService::hash_password(new_password)?;
        user.audit.touch(actor);
        self.store.update_user(user).await?;
        info!("Password changed successfully for user with id: {}", id);
        Ok(())
    }
}
