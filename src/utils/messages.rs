//! User-facing strings, in the product's locale (Italian).

pub const FILE_TOO_LARGE: &str = "File troppo grande. La dimensione massima è 10MB";
pub const FILE_INVALID_TYPE: &str = "Formato file non supportato. Usa JPEG, PNG o WebP";
pub const FILE_TOO_MANY: &str = "Puoi caricare una sola foto alla volta";
pub const TITLE_REQUIRED: &str = "Il titolo è obbligatorio";
pub const NO_FILE_STAGED: &str = "Seleziona una foto prima di inviare";
pub const NETWORK_ERROR: &str = "Errore di rete. Riprova";
pub const PAYMENT_RESET: &str =
    "Si è verificato un problema con il pagamento. Ricarica la foto e riprova";
pub const UPLOAD_SUCCESS: &str = "Foto caricata e partecipazione confermata!";
pub const PENDING_REVIEW_NOTICE: &str =
    "La foto è in revisione manuale: la pubblicazione avverrà dopo l'approvazione";
