use std::error::Error;

pub enum ExitResult<T> {
    Ok(T),
    Err(Box<dyn Error>, i32),
}

impl<T> ExitResult<T> {
    pub fn err_from<E: Error + 'static>(e: E, code: i32) -> ExitResult<T> {
        ExitResult::Err(Box::new(e), code)
    }

    /// The process exit code, printing the error if there was one.
    pub fn report(self) -> i32 {
        match self {
            ExitResult::Ok(_) => 0,
            ExitResult::Err(b, c) => {
                eprintln!("Error: {}", b);
                c
            }
        }
    }
}

impl<T, E: Error + 'static> From<Result<T, E>> for ExitResult<T> {
    fn from(r: Result<T, E>) -> Self {
        match r {
            Ok(t) => ExitResult::Ok(t),
            Err(e) => ExitResult::err_from(e, 1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn exit_codes() {
        assert_eq!(0, ExitResult::Ok(()).report());
        let err: ExitResult<()> =
            ExitResult::err_from(io::Error::new(io::ErrorKind::Other, "boom"), 3);
        assert_eq!(3, err.report());
        let r: io::Result<()> = Err(io::Error::from_raw_os_error(libc::ENOTTY));
        assert_eq!(1, ExitResult::from(r).report());
    }
}
