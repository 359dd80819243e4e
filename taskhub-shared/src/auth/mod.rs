/// Authentication and authorization
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and verification
/// - [`jwt`]: HS256 token issuing and validation
/// - [`middleware`]: Bearer-token request authentication
/// - [`authorization`]: Project roles and the project/task access guards
///
/// # Example
///
/// ```
/// use taskhub_shared::auth::password::{hash_password, verify_password};
/// use taskhub_shared::auth::jwt::{create_token, validate_token, Claims};
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("user_password")?;
/// assert!(verify_password("user_password", &hash)?);
///
/// let user_id = Uuid::new_v4();
/// let token = create_token(&Claims::new(user_id), "secret-key-of-at-least-32-bytes!")?;
/// assert_eq!(validate_token(&token, "secret-key-of-at-least-32-bytes!")?.sub, user_id);
/// # Ok(())
/// # }
/// ```

pub mod authorization;
pub mod jwt;
pub mod middleware;
pub mod password;
