use tryon::TryOnError;

pub fn report_error(err: &TryOnError) {
    match err {
        TryOnError::GenerationFailed { reason } => {
            eprintln!("Could not generate a try-on image.");
            eprintln!("  Reason: {reason}");
            eprintln!();
            eprintln!("Allow the overlay fallback (drop --no-fallback) or use --method overlay.");
        }
        TryOnError::GarmentNotFound { id } => {
            eprintln!("Garment `{id}` is not in the catalog.");
            eprintln!("Check --garment-id against the `id` fields of the catalog file.");
        }
        TryOnError::Decode { role, source } => {
            eprintln!("The {role} image could not be read: {source}");
        }
        _ => {
            eprintln!("{err}");
        }
    }
}
