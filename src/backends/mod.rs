/*!
 * Audio backend implementations.
 *
 * - `headless`: Silent backend used by the command-line player
 * - `mock`: Recording backend with configurable failures, for tests
 */

pub mod headless;
pub mod mock;

pub use self::headless::HeadlessAudioBackend;
pub use self::mock::{MockAudioBackend, MockBehavior, MockCall, MockHandleInfo};
