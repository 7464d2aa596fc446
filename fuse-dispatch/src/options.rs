//! libfuse mount options

use crate::error::Error;

use std::str::FromStr;

/// An ordered set of libfuse options, `name` or `name=value`
///
/// Values are passed to libfuse verbatim. The typed accessors only check
/// that a value parses.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MountOptions {
    items: Vec<(String, Option<String>)>,
}

impl MountOptions {
    /// Creates an empty option set
    #[must_use]
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets an option, replacing a previous value of the same name
    #[inline]
    pub fn set(&mut self, name: impl Into<String>, value: Option<String>) -> &mut Self {
        let name = name.into();
        match self.items.iter_mut().find(|(key, _)| *key == name) {
            Some(item) => item.1 = value,
            None => self.items.push((name, value)),
        }
        self
    }

    /// Returns `Some(value)` when the option is present, where `value` is
    /// `None` for a bare flag
    #[must_use]
    #[inline]
    pub fn get(&self, name: &str) -> Option<Option<&str>> {
        self.items
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_deref())
    }

    /// The value of an option, `None` when absent or bare
    #[must_use]
    #[inline]
    pub fn value(&self, name: &str) -> Option<&str> {
        self.get(name).flatten()
    }

    /// Whether the option is present
    #[must_use]
    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Removes an option, returning its value
    #[inline]
    pub fn remove(&mut self, name: &str) -> Option<Option<String>> {
        let pos = self.items.iter().position(|(key, _)| key == name)?;
        Some(self.items.remove(pos).1)
    }

    /// Iterates options in insertion order
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> + '_ {
        self.items
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_deref()))
    }

    /// The number of options
    #[must_use]
    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether no option is set
    #[must_use]
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    option_flags! {
        /// Debug output of libfuse, passed as `-d`
        debug, set_debug => "debug";
        /// Allows access by other users
        allow_other, set_allow_other => "allow_other";
        /// Allows access by root
        allow_root, set_allow_root => "allow_root";
        /// Allows mounting over a non-empty directory
        nonempty, set_nonempty => "nonempty";
        /// Lets the kernel check permissions
        default_permissions, set_default_permissions => "default_permissions";
        /// Issues large read requests
        large_read, set_large_read => "large_read";
        /// Removes files immediately instead of hiding them
        hard_remove, set_hard_remove => "hard_remove";
        /// Uses inode numbers reported by the file system
        use_ino, set_use_ino => "use_ino";
        /// Fills in inode numbers of directory entries
        readdir_ino, set_readdir_ino => "readdir_ino";
        /// Bypasses the page cache
        direct_io, set_direct_io => "direct_io";
    }

    /// The file system name shown in the mount table
    #[must_use]
    #[inline]
    pub fn fsname(&self) -> Option<&str> {
        self.value("fsname")
    }

    /// Sets the file system name
    #[inline]
    pub fn set_fsname(&mut self, name: impl Into<String>) -> &mut Self {
        self.set("fsname", Some(name.into()))
    }

    fn parsed<T: FromStr>(&self, name: &str) -> Result<Option<T>, Error> {
        self.parsed_with(name, str::parse)
    }

    fn parsed_with<T, E>(
        &self,
        name: &str,
        parse: impl FnOnce(&str) -> Result<T, E>,
    ) -> Result<Option<T>, Error> {
        let invalid = |value: Option<&str>| Error::InvalidOption {
            name: name.to_owned(),
            value: value.map(str::to_owned),
        };
        match self.get(name) {
            None => Ok(None),
            Some(None) => Err(invalid(None)),
            Some(Some(value)) => parse(value).map(Some).map_err(|_| invalid(Some(value))),
        }
    }

    /// The maximum size of a read request
    /// # Errors
    /// Returns [`Error::InvalidOption`] when the value is not a `u32`
    #[inline]
    pub fn max_read(&self) -> Result<Option<u32>, Error> {
        self.parsed("max_read")
    }

    /// Sets `max_read`
    #[inline]
    pub fn set_max_read(&mut self, size: u32) -> &mut Self {
        self.set("max_read", Some(size.to_string()))
    }

    /// The permission mask applied to every file, in octal
    /// # Errors
    /// Returns [`Error::InvalidOption`] when the value is not octal
    #[inline]
    pub fn umask(&self) -> Result<Option<u32>, Error> {
        self.parsed_with("umask", |value| u32::from_str_radix(value, 8))
    }

    /// Sets `umask`
    #[inline]
    pub fn set_umask(&mut self, umask: u32) -> &mut Self {
        self.set("umask", Some(format!("{:o}", umask)))
    }

    /// The owner reported for every file
    /// # Errors
    /// Returns [`Error::InvalidOption`] when the value is not a `u32`
    #[inline]
    pub fn uid(&self) -> Result<Option<u32>, Error> {
        self.parsed("uid")
    }

    /// Sets `uid`
    #[inline]
    pub fn set_uid(&mut self, uid: u32) -> &mut Self {
        self.set("uid", Some(uid.to_string()))
    }

    /// The group reported for every file
    /// # Errors
    /// Returns [`Error::InvalidOption`] when the value is not a `u32`
    #[inline]
    pub fn gid(&self) -> Result<Option<u32>, Error> {
        self.parsed("gid")
    }

    /// Sets `gid`
    #[inline]
    pub fn set_gid(&mut self, gid: u32) -> &mut Self {
        self.set("gid", Some(gid.to_string()))
    }

    /// Seconds the kernel caches name lookups
    /// # Errors
    /// Returns [`Error::InvalidOption`] when the value is not a number
    #[inline]
    pub fn entry_timeout(&self) -> Result<Option<f64>, Error> {
        self.parsed("entry_timeout")
    }

    /// Sets `entry_timeout`
    #[inline]
    pub fn set_entry_timeout(&mut self, secs: f64) -> &mut Self {
        self.set("entry_timeout", Some(secs.to_string()))
    }

    /// Seconds the kernel caches failed lookups
    /// # Errors
    /// Returns [`Error::InvalidOption`] when the value is not a number
    #[inline]
    pub fn negative_timeout(&self) -> Result<Option<f64>, Error> {
        self.parsed("negative_timeout")
    }

    /// Sets `negative_timeout`
    #[inline]
    pub fn set_negative_timeout(&mut self, secs: f64) -> &mut Self {
        self.set("negative_timeout", Some(secs.to_string()))
    }

    /// Seconds the kernel caches attributes
    /// # Errors
    /// Returns [`Error::InvalidOption`] when the value is not a number
    #[inline]
    pub fn attr_timeout(&self) -> Result<Option<f64>, Error> {
        self.parsed("attr_timeout")
    }

    /// Sets `attr_timeout`
    #[inline]
    pub fn set_attr_timeout(&mut self, secs: f64) -> &mut Self {
        self.set("attr_timeout", Some(secs.to_string()))
    }

    /// Builds the argument vector passed to `fuse_mount` and `fuse_new`
    #[must_use]
    #[inline]
    pub fn to_argv(&self, program: &str) -> Vec<String> {
        let mut argv = vec![program.to_owned()];
        for (name, value) in self.iter() {
            if name == "debug" {
                argv.push(String::from("-d"));
                continue;
            }
            match value {
                Some(value) => argv.push(format!("-o{}={}", name, value)),
                None => argv.push(format!("-o{}", name)),
            }
        }
        argv
    }
}

/// The result of [`parse_args`]
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedArgs {
    /// the options given by `-o` and `-d`
    pub options: MountOptions,
    /// `false` when `-s` was given
    pub multithreaded: bool,
    /// the arguments not interpreted as options
    pub unhandled: Vec<String>,
}

impl ParsedArgs {
    /// The mount point, the last unhandled argument
    #[must_use]
    #[inline]
    pub fn mount_point(&self) -> Option<&str> {
        self.unhandled.last().map(String::as_str)
    }
}

fn add_options(options: &mut MountOptions, list: &str) {
    for item in list.split(',').filter(|item| !item.is_empty()) {
        match item.find('=') {
            Some(pos) => {
                let _ = options.set(&item[..pos], Some(item[pos.wrapping_add(1)..].to_owned()));
            }
            None => {
                let _ = options.set(item, None);
            }
        }
    }
}

/// Parses libfuse style arguments
///
/// Recognizes `-o opts`, `-oopts`, `-d`, `-s`, `-f` and `--`. `opts` is a
/// comma separated list of `name` or `name=value`. Everything else is
/// returned as unhandled.
///
/// # Errors
/// Returns [`Error::InvalidOption`] when `-o` has no value
#[inline]
pub fn parse_args<I, S>(args: I) -> Result<ParsedArgs, Error>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut parsed = ParsedArgs {
        options: MountOptions::new(),
        multithreaded: true,
        unhandled: Vec::new(),
    };

    let mut args = args.into_iter().map(Into::<String>::into);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--" => {
                parsed.unhandled.extend(args.by_ref());
                break;
            }
            "-o" => match args.next() {
                Some(list) => add_options(&mut parsed.options, &list),
                None => {
                    return Err(Error::InvalidOption {
                        name: String::from("-o"),
                        value: None,
                    })
                }
            },
            "-d" => {
                let _ = parsed.options.set_debug(true);
            }
            "-s" => parsed.multithreaded = false,
            "-f" => {}
            other if other.starts_with("-o") => add_options(&mut parsed.options, &other[2..]),
            _ => parsed.unhandled.push(arg),
        }
    }
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map() {
        let mut options = MountOptions::new();
        let _ = options.set("fsname", Some(String::from("hello")));
        let _ = options.set_allow_other(true);
        assert_eq!(options.get("allow_other"), Some(None));
        assert_eq!(options.fsname(), Some("hello"));
        assert!(options.allow_other());
        assert!(!options.allow_root());

        let _ = options.set_fsname("world");
        assert_eq!(options.len(), 2);
        assert_eq!(options.value("fsname"), Some("world"));

        let _ = options.set_allow_other(false);
        assert!(!options.contains("allow_other"));
        assert_eq!(options.remove("fsname"), Some(Some(String::from("world"))));
        assert!(options.is_empty());
    }

    #[test]
    fn typed_values() {
        let mut options = MountOptions::new();
        assert_eq!(options.max_read().unwrap(), None);

        let _ = options
            .set_max_read(4096)
            .set_umask(0o022)
            .set_uid(1000)
            .set_attr_timeout(1.5);
        assert_eq!(options.value("umask"), Some("22"));
        assert_eq!(options.umask().unwrap(), Some(0o022));
        assert_eq!(options.max_read().unwrap(), Some(4096));
        assert_eq!(options.uid().unwrap(), Some(1000));
        assert_eq!(options.attr_timeout().unwrap(), Some(1.5));

        let _ = options.set("gid", Some(String::from("staff")));
        assert!(matches!(
            options.gid(),
            Err(Error::InvalidOption { ref name, value: Some(ref value) })
                if name == "gid" && value == "staff"
        ));

        let _ = options.set("umask", Some(String::from("9")));
        assert!(options.umask().is_err());

        let _ = options.set("entry_timeout", None);
        assert!(matches!(
            options.entry_timeout(),
            Err(Error::InvalidOption { value: None, .. })
        ));
    }

    #[test]
    fn argv() {
        let mut options = MountOptions::new();
        let _ = options
            .set_debug(true)
            .set_fsname("hello")
            .set_default_permissions(true);
        assert_eq!(
            options.to_argv("hellofs"),
            ["hellofs", "-d", "-ofsname=hello", "-odefault_permissions"]
        );
    }

    #[test]
    fn parse() {
        let parsed = parse_args(vec![
            "-o",
            "allow_other,fsname=a=b",
            "-oro",
            "-d",
            "-f",
            "-s",
            "extra",
            "/mnt",
        ])
        .unwrap();

        assert!(!parsed.multithreaded);
        assert!(parsed.options.allow_other());
        assert!(parsed.options.debug());
        assert_eq!(parsed.options.fsname(), Some("a=b"));
        assert!(parsed.options.contains("ro"));
        assert_eq!(parsed.unhandled, ["extra", "/mnt"]);
        assert_eq!(parsed.mount_point(), Some("/mnt"));
    }

    #[test]
    fn parse_edges() {
        let parsed = parse_args(vec!["/mnt", "--", "-d"]).unwrap();
        assert!(parsed.multithreaded);
        assert!(!parsed.options.debug());
        assert_eq!(parsed.mount_point(), Some("-d"));

        assert!(matches!(
            parse_args(vec!["/mnt", "-o"]),
            Err(Error::InvalidOption { .. })
        ));

        let parsed = parse_args(Vec::<String>::new()).unwrap();
        assert_eq!(parsed.mount_point(), None);
    }
}
