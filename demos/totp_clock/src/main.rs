use chrono::{offset, Duration};
use oxidetotp::{totp::Totp, DEMO_SECRET};

pub fn main() -> anyhow::Result<()> {
    // The secret comes from the first argument, falling back to the demo secret
    let secret = std::env::args().nth(1).unwrap_or_else(|| DEMO_SECRET.into());
    let totp = Totp::from_secret(&secret)?;

    // Get seconds since Unix Epoch
    let now = offset::Local::now();
    let seconds = u64::try_from(now.timestamp()).unwrap_or_default();

    let code = totp.generate(seconds);
    let remaining = Totp::remaining_seconds(seconds);
    let expires = now + Duration::seconds(remaining as i64);

    println!(
        "Code: {}, valid until {} ({}s left)",
        code,
        expires.format("%H:%M:%S"),
        remaining
    );

    Ok(())
}
