use homeroom_store::Store;
use homeroom_types::VerificationCode;

pub fn code_by_value(store: &Store, code: &str) -> Option<VerificationCode> {
    store.verification_codes().find(|c| c.code == code).cloned()
}
