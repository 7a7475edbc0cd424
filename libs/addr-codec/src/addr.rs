use crate::error::Error;

/// A parsed IP address of either family, reduced to its integer form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Addr {
    /// An IPv4 address as a big-endian `u32`
    V4(u32),
    /// An IPv6 address as a big-endian `u128`
    V6(u128),
}

/// Parses a textual address of either family, selecting the family by the
/// presence of a `:` separator
pub fn parse_addr(text: &str) -> Result<Addr, Error> {
    if text.contains(':') {
        parse_ipv6(text).map(Addr::V6)
    } else {
        parse_ipv4(text).map(Addr::V4)
    }
}

/// Parses a dotted-quad IPv4 address into a `u32`, most significant octet first
pub fn parse_ipv4(text: &str) -> Result<u32, Error> {
    let mut value: u32 = 0;
    let mut octets: usize = 0;
    for part in text.split('.') {
        if octets == 4 || part.is_empty() || !part.bytes().all(|byte| byte.is_ascii_digit()) {
            return Err(Error::InvalidAddress(text.to_string()));
        }
        let octet: u32 = part
            .parse()
            .map_err(|_| Error::InvalidAddress(text.to_string()))?;
        if octet > 255 {
            return Err(Error::InvalidAddress(text.to_string()));
        }
        value = (value << 8) | octet;
        octets += 1;
    }
    if octets != 4 {
        return Err(Error::InvalidAddress(text.to_string()));
    }
    Ok(value)
}

/// Parses a textual IPv6 address into a `u128`, most significant hextet first
///
/// At most one `::` zero-run compression is accepted. Without it, the address
/// must contain exactly 8 hextets; with it, the omitted middle is filled with
/// zero hextets until the total reaches 8.
pub fn parse_ipv6(text: &str) -> Result<u128, Error> {
    let mut halves = text.splitn(3, "::");
    let head = halves.next().unwrap_or("");
    let tail = halves.next();
    if halves.next().is_some() {
        // More than one "::"
        return Err(Error::InvalidAddress(text.to_string()));
    }

    let mut hextets: Vec<u16> = Vec::with_capacity(8);
    match tail {
        None => {
            for part in head.split(':') {
                hextets.push(parse_hextet(part, text)?);
            }
            if hextets.len() != 8 {
                return Err(Error::InvalidAddress(text.to_string()));
            }
        }
        Some(tail) => {
            let left: Vec<&str> = if head.is_empty() {
                Vec::new()
            } else {
                head.split(':').collect()
            };
            let right: Vec<&str> = if tail.is_empty() {
                Vec::new()
            } else {
                tail.split(':').collect()
            };
            if left.len() + right.len() > 8 {
                return Err(Error::InvalidAddress(text.to_string()));
            }
            let omitted = 8 - left.len() - right.len();
            for part in left {
                hextets.push(parse_hextet(part, text)?);
            }
            for _ in 0..omitted {
                hextets.push(0);
            }
            for part in right {
                hextets.push(parse_hextet(part, text)?);
            }
        }
    }

    Ok(hextets
        .into_iter()
        .fold(0u128, |value, hextet| (value << 16) | u128::from(hextet)))
}

/// Parses a single 1-4 digit hexadecimal hextet
///
/// An empty hextet (produced by malformed input such as `1:::2` remnants or a
/// stray trailing `:`) must be rejected here rather than silently read as zero.
fn parse_hextet(part: &str, text: &str) -> Result<u16, Error> {
    if part.is_empty() || part.len() > 4 || !part.bytes().all(|byte| byte.is_ascii_hexdigit()) {
        return Err(Error::InvalidAddress(text.to_string()));
    }
    u16::from_str_radix(part, 16).map_err(|_| Error::InvalidAddress(text.to_string()))
}
