//! Token classifiers shared by vendor grammars.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// IPv4 or IPv6 address without a mask.
pub fn is_address(token: &str) -> bool {
    token.parse::<IpAddr>().is_ok()
}

/// Route prefix: `10.0.0.0/24`, `10.0.0.0/255.255.255.0`, `2001:db8::/32`,
/// or a route-distinguisher prefix such as `65500:10:1.2.3.4/32`.
pub fn is_prefix(token: &str) -> bool {
    let Some((address, mask)) = token.split_once('/') else {
        return false;
    };
    if address.parse::<Ipv4Addr>().is_ok() {
        return mask_fits(mask, 32);
    }
    if address.parse::<Ipv6Addr>().is_ok() {
        return mask_fits(mask, 128);
    }
    strip_route_distinguisher(address)
        .is_some_and(|inner| inner.parse::<Ipv4Addr>().is_ok() && mask_fits(mask, 32))
}

fn mask_fits(mask: &str, max_bits: u32) -> bool {
    if is_integer(mask) {
        return mask.parse::<u32>().is_ok_and(|bits| bits <= max_bits);
    }
    max_bits == 32
        && mask.parse::<Ipv4Addr>().is_ok_and(|quad| {
            let bits = u32::from(quad);
            bits.leading_ones() + bits.trailing_zeros() == 32
        })
}

fn strip_route_distinguisher(address: &str) -> Option<&str> {
    let mut parts = address.splitn(3, ':');
    let administrator = parts.next()?;
    let assigned = parts.next()?;
    let inner = parts.next()?;
    let administrator_ok =
        is_integer(administrator) || administrator.parse::<Ipv4Addr>().is_ok();
    (administrator_ok && is_integer(assigned)).then_some(inner)
}

/// Non-empty run of ASCII digits.
pub fn is_integer(token: &str) -> bool {
    !token.is_empty() && token.bytes().all(|b| b.is_ascii_digit())
}

/// Parse an unsigned integer token, rejecting signs and blanks.
pub fn parse_number(token: &str) -> Option<u32> {
    if !is_integer(token) {
        return None;
    }
    token.parse().ok()
}

/// Route age as printed by devices: `10h49m31s`, `25d20h48m`, `0241d11h`.
pub fn is_age(token: &str) -> bool {
    let mut units = String::new();
    let mut digits = 0usize;
    for ch in token.chars() {
        if ch.is_ascii_digit() {
            digits += 1;
            continue;
        }
        if digits == 0 {
            return false;
        }
        units.push(ch);
        digits = 0;
    }
    digits == 0 && matches!(units.as_str(), "hms" | "dhm" | "dh")
}

/// `token` equals `keyword` or abbreviates it with at least `min` characters
/// (`di` for `display`). Comparison ignores ASCII case.
pub fn abbreviates(token: &str, keyword: &str, min: usize) -> bool {
    token.len() >= min
        && token.len() <= keyword.len()
        && keyword.as_bytes()[..token.len()].eq_ignore_ascii_case(token.as_bytes())
}

/// Line made only of `ch`, at least two characters long once trimmed.
pub fn is_divider(line: &str, ch: char) -> bool {
    let trimmed = line.trim();
    trimmed.len() >= 2 && trimmed.chars().all(|c| c == ch)
}

/// Tokens of a command echo with the device prompt removed.
///
/// Handles `*A:7750# show ...`, `A:pe1>config>service>vprn$ show ...`,
/// `<HUAWEI>display ...` and `[~HUAWEI]display ...`.
pub fn command_tokens(line: &str) -> Vec<&str> {
    let trimmed = line.trim();
    let command = match trimmed.chars().next() {
        Some('<') => trimmed.split_once('>').map_or(trimmed, |(_, rest)| rest),
        Some('[') => trimmed.split_once(']').map_or(trimmed, |(_, rest)| rest),
        _ => trimmed,
    };
    let tokens: Vec<&str> = command.split_whitespace().collect();
    match tokens
        .iter()
        .position(|token| token.ends_with('#') || token.ends_with('$'))
    {
        Some(prompt_end) => tokens[prompt_end + 1..].to_vec(),
        None => tokens,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefixes_cover_vendor_shapes() {
        for good in [
            "10.0.0.0/24",
            "0.0.0.0/0",
            "1.1.1.1/32",
            "10.0.0.0/255.255.255.0",
            "2001:db8::/32",
            "::/0",
            "65500:10:1.2.3.4/32",
            "192.0.2.1:10:1.2.3.0/24",
        ] {
            assert!(is_prefix(good), "{good} should be a prefix");
        }
        for bad in [
            "10.0.0.1",
            "10.0.0.0/33",
            "2001:db8::/129",
            "10.0.0.0/255.0.255.0",
            "loop-1",
            "Black",
            "10.0.0.0/",
            "65500:x:1.2.3.4/32",
        ] {
            assert!(!is_prefix(bad), "{bad} should not be a prefix");
        }
    }

    #[test]
    fn ages_accept_device_formats_only() {
        for good in ["10h49m31s", "25d20h48m", "0241d11h", "76d07h31m", "00h01m22s"] {
            assert!(is_age(good), "{good} should be an age");
        }
        for bad in ["170", "h10", "10x", "BGP", ""] {
            assert!(!is_age(bad), "{bad} should not be an age");
        }
    }

    #[test]
    fn abbreviations_need_minimum_length() {
        assert!(abbreviates("di", "display", 2));
        assert!(abbreviates("DISPLAY", "display", 2));
        assert!(!abbreviates("d", "display", 2));
        assert!(!abbreviates("displays", "display", 2));
        assert!(!abbreviates("dx", "display", 2));
    }

    #[test]
    fn command_tokens_strip_prompts() {
        assert_eq!(
            command_tokens("*A:7750>config>service>vprn$ show router 99 route-table "),
            vec!["show", "router", "99", "route-table"]
        );
        assert_eq!(
            command_tokens("<HUAWEI>display ip routing-table"),
            vec!["display", "ip", "routing-table"]
        );
        assert_eq!(
            command_tokens("[~PE1]dis ip rou vpn-instance blue"),
            vec!["dis", "ip", "rou", "vpn-instance", "blue"]
        );
        assert_eq!(command_tokens("show router bgp routes"), vec!["show", "router", "bgp", "routes"]);
    }
}
