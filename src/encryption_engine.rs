use argon2::{
	password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
	Argon2,
};
use base64::{
	alphabet,
	engine::{self, general_purpose},
};
use rand::RngCore;

pub const CUSTOM_ENGINE: engine::GeneralPurpose = engine::GeneralPurpose::new(&alphabet::URL_SAFE, general_purpose::NO_PAD);

const SALT_LEN: usize = 16;

/// Argon2id PHC string (`$argon2id$v=19$...`) stored in `users.password`.
pub fn hash_password(password: &str) -> Result<String, password_hash::Error> {
	let mut salt = [0u8; SALT_LEN];
	rand::thread_rng().fill_bytes(&mut salt);
	let salt = SaltString::encode_b64(&salt)?;
	Ok(Argon2::default().hash_password(password.as_bytes(), &salt)?.to_string())
}

pub fn verify_password(password: &str, stored: &str) -> bool {
	let Ok(parsed) = PasswordHash::new(stored) else {
		return false;
	};
	Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok()
}
