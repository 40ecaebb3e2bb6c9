/*!
 * Protocol layer — data structures, constants, and credential handling.
 *
 * Everything related to *what* we send to the collector:
 * - `types` — Event, Level, interface records
 * - `interfaces` — interface builder functions with field limits
 * - `constants` — client identity, defaults, length limits
 * - `dsn` — connection string parsing and submission URL derivation
 * - `auth` — the `X-Sentry-Auth` header
 */

pub mod auth;
pub mod constants;
pub mod dsn;
pub mod interfaces;
pub mod types;
