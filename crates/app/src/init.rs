use homeroom_store::Store;
use homeroom_types::VerificationCode;

/// Seed one-time teacher verification codes
pub fn seed_verification_codes(store: &mut Store, codes: &[String]) {
    if codes.is_empty() {
        return;
    }
    tracing::info!("🎫 Seeding {} verification codes...", codes.len());
    for code in codes {
        let id = store.next_id();
        store.insert_verification_code(VerificationCode {
            id,
            code: code.clone(),
            is_verified: false,
        });
        tracing::info!("  ✓ {}", code);
    }
}
