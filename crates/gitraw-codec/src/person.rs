use serde::{Deserialize, Serialize};

use crate::{CodecError, Result};

/// The `name <email> unix-seconds timezone` payload of an `author`,
/// `committer`, or `tagger` header.
///
/// Every field holds raw bytes exactly as parsed. `date` and `timezone`
/// may be empty; `name` may be empty, contain doubled spaces, or end in a
/// space, and the renderer reproduces all of those forms.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonInfo {
    pub name: Vec<u8>,
    pub email: Vec<u8>,
    pub date: Vec<u8>,
    pub timezone: Vec<u8>,
}

impl PersonInfo {
    /// Parse a full header line including its keyword (`author ...`,
    /// `tagger ...`). The keyword token is skipped, not validated.
    pub fn parse(line: &[u8]) -> Result<Self> {
        let parts: Vec<&[u8]> = line.split(|&b| b == b' ').collect();
        if parts.len() < 3 {
            return Err(malformed(line));
        }

        // Gather name tokens until one opens the email bracket. An empty
        // token is a doubled space; appending a bare space for it keeps
        // trailing-space names intact once the joiner below is dropped.
        let mut at = 1;
        let mut name: Vec<u8> = Vec::new();
        loop {
            if at == parts.len() {
                return Err(malformed(line));
            }
            let part = parts[at];
            if !part.is_empty() {
                if part[0] == b'<' {
                    break;
                }
                name.extend_from_slice(part);
                name.push(b' ');
            } else if !name.is_empty() {
                name.push(b' ');
            }
            at += 1;
        }
        name.pop();

        // The email runs to the first token closing the bracket; embedded
        // spaces and commas are part of it. Only the opening token loses
        // its `<`, so an embedded angle bracket survives a round trip.
        let mut email: Vec<u8> = Vec::new();
        let mut opening = true;
        loop {
            if at == parts.len() {
                return Err(malformed(line));
            }
            let mut part = parts[at];
            if opening {
                part = &part[1..];
                opening = false;
            }
            at += 1;
            if let Some((&b'>', head)) = part.split_last() {
                email.extend_from_slice(head);
                break;
            }
            email.extend_from_slice(part);
            email.push(b' ');
        }

        let date = parts.get(at).map(|p| p.to_vec()).unwrap_or_default();
        let timezone = parts.get(at + 1).map(|p| p.to_vec()).unwrap_or_default();

        Ok(PersonInfo {
            name,
            email,
            date,
            timezone,
        })
    }

    /// Render without the keyword prefix: `name <email>[ date[ timezone]]`.
    pub fn render(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.name.len() + self.email.len() + 16);
        out.extend_from_slice(&self.name);
        out.extend_from_slice(b" <");
        out.extend_from_slice(&self.email);
        out.push(b'>');
        if !self.date.is_empty() {
            out.push(b' ');
            out.extend_from_slice(&self.date);
        }
        if !self.timezone.is_empty() {
            out.push(b' ');
            out.extend_from_slice(&self.timezone);
        }
        out
    }
}

fn malformed(line: &[u8]) -> CodecError {
    CodecError::MalformedPerson(String::from_utf8_lossy(line).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn parsed(line: &[u8]) -> PersonInfo {
        PersonInfo::parse(line).unwrap()
    }

    #[test]
    fn plain_person_line() {
        let pi = parsed(b"author Jaden Doe <j.doe@example.com> 1517914295 +0100");
        assert_eq!(pi.name, b"Jaden Doe");
        assert_eq!(pi.email, b"j.doe@example.com");
        assert_eq!(pi.date, b"1517914295");
        assert_eq!(pi.timezone, b"+0100");
        assert_eq!(pi.render(), b"Jaden Doe <j.doe@example.com> 1517914295 +0100");
    }

    #[test]
    fn empty_name() {
        let pi = parsed(b"tagger  <e@x> 1 +0000");
        assert_eq!(pi.name, b"");
        assert_eq!(pi.email, b"e@x");
        assert_eq!(pi.date, b"1");
        assert_eq!(pi.timezone, b"+0000");
        assert_eq!(pi.render(), b" <e@x> 1 +0000");
    }

    #[test]
    fn trailing_space_in_name() {
        let pi = parsed(b"author Someone  <e@x> 1 +0000");
        assert_eq!(pi.name, b"Someone ");
        assert_eq!(pi.render(), b"Someone  <e@x> 1 +0000");
    }

    #[test]
    fn doubled_space_inside_name() {
        let pi = parsed(b"author A  B <e@x> 1 +0000");
        assert_eq!(pi.name, b"A  B");
        assert_eq!(pi.render(), b"A  B <e@x> 1 +0000");
    }

    #[test]
    fn email_with_spaces_and_commas() {
        let pi = parsed(b"committer Corp <dev null, eng@corp.example> 10 -0545");
        assert_eq!(pi.name, b"Corp");
        assert_eq!(pi.email, b"dev null, eng@corp.example");
        assert_eq!(pi.timezone, b"-0545");
        assert_eq!(
            pi.render(),
            b"Corp <dev null, eng@corp.example> 10 -0545"
        );
    }

    #[test]
    fn email_with_embedded_angle_bracket() {
        let pi = parsed(b"author A <a <b@x> 1 +0000");
        assert_eq!(pi.email, b"a <b@x");
        assert_eq!(pi.render(), b"A <a <b@x> 1 +0000");
    }

    #[test]
    fn non_ascii_name() {
        let pi = parsed("author Łukasz Żółw <l@x> 7 +0200".as_bytes());
        assert_eq!(pi.name, "Łukasz Żółw".as_bytes());
        assert_eq!(pi.render(), "Łukasz Żółw <l@x> 7 +0200".as_bytes());
    }

    #[test]
    fn missing_date_and_timezone() {
        let pi = parsed(b"tagger A <a@x>");
        assert_eq!(pi.date, b"");
        assert_eq!(pi.timezone, b"");
        assert_eq!(pi.render(), b"A <a@x>");
    }

    #[test]
    fn date_without_timezone() {
        let pi = parsed(b"tagger A <a@x> 99");
        assert_eq!(pi.date, b"99");
        assert_eq!(pi.timezone, b"");
        assert_eq!(pi.render(), b"A <a@x> 99");
    }

    #[test]
    fn rejects_too_few_tokens() {
        assert!(matches!(
            PersonInfo::parse(b"author A"),
            Err(CodecError::MalformedPerson(_))
        ));
    }

    #[test]
    fn rejects_unclosed_email() {
        assert!(matches!(
            PersonInfo::parse(b"author A <a@x 1"),
            Err(CodecError::MalformedPerson(_))
        ));
    }

    #[test]
    fn rejects_line_without_email() {
        assert!(matches!(
            PersonInfo::parse(b"author A B C"),
            Err(CodecError::MalformedPerson(_))
        ));
    }

    prop_compose! {
        // Names the parser can round-trip: no '<', no leading space, and
        // at most one trailing space.
        fn arb_name()(name in "([A-Za-z0-9._@-]{1,10}( {1,2}[A-Za-z0-9._@-]{1,10}){0,3} ?)?") -> Vec<u8> {
            name.into_bytes()
        }
    }

    prop_compose! {
        fn arb_email()(email in "[A-Za-z0-9._@+,-]{0,12}( [A-Za-z0-9._@+,-]{1,8}){0,2}") -> Vec<u8> {
            email.into_bytes()
        }
    }

    // A timezone only renders after a date, so generate the pair together.
    fn arb_date_tz() -> impl Strategy<Value = (Vec<u8>, Vec<u8>)> {
        prop_oneof![
            Just((Vec::new(), Vec::new())),
            "[0-9]{1,10}".prop_map(|d| (d.into_bytes(), Vec::new())),
            ("[0-9]{1,10}", "[+-][0-9]{4}")
                .prop_map(|(d, t)| (d.into_bytes(), t.into_bytes())),
        ]
    }

    proptest! {
        #[test]
        fn render_parse_identity(
            name in arb_name(),
            email in arb_email(),
            (date, timezone) in arb_date_tz(),
        ) {
            let pi = PersonInfo { name, email, date, timezone };
            let mut line = b"author ".to_vec();
            line.extend_from_slice(&pi.render());
            let reparsed = PersonInfo::parse(&line).unwrap();
            prop_assert_eq!(&reparsed, &pi);
            prop_assert_eq!(reparsed.render(), pi.render());
        }
    }
}
