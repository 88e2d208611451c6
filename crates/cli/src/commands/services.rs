//! Service catalogue listing.

use correio_labels_core::services::SERVICES;

/// Print every known service as `code  name`.
pub fn list() {
    #[allow(clippy::print_stdout)]
    for service in SERVICES {
        println!("{}  {}", service.code, service.name);
    }
}
