//! Arguments of one wrap/unwrap call: the network buffer and a sub-range
//! of the application buffers, with a snapshot for rollback.

use std::ops::Range;

use tlsrec_types::TlsError;

use super::buffer::Buffer;

pub struct EngineArgs<'a> {
    pub(crate) net: &'a mut Buffer,
    apps: &'a mut [Buffer],
    net_pos: usize,
    net_lim: usize,
    app_pos: Vec<usize>,
    app_lim: Vec<usize>,
    app_remaining: usize,
}

impl<'a> EngineArgs<'a> {
    /// Arguments for wrap: application data is gathered into `net`.
    pub fn for_wrap(
        apps: &'a mut [Buffer],
        offset: usize,
        len: usize,
        net: &'a mut Buffer,
    ) -> Result<Self, TlsError> {
        let apps = sub_range(apps, offset, len)?;
        if net.is_read_only() {
            return Err(TlsError::ReadOnlyBuffer);
        }
        Ok(Self::snapshot(net, apps))
    }

    /// Arguments for unwrap: decrypted data is scattered into `apps`.
    pub fn for_unwrap(
        net: &'a mut Buffer,
        apps: &'a mut [Buffer],
        offset: usize,
        len: usize,
    ) -> Result<Self, TlsError> {
        let apps = sub_range(apps, offset, len)?;
        if apps.iter().any(Buffer::is_read_only) {
            return Err(TlsError::ReadOnlyBuffer);
        }
        Ok(Self::snapshot(net, apps))
    }

    fn snapshot(net: &'a mut Buffer, apps: &'a mut [Buffer]) -> Self {
        Self {
            net_pos: net.position(),
            net_lim: net.limit(),
            app_pos: apps.iter().map(Buffer::position).collect(),
            app_lim: apps.iter().map(Buffer::limit).collect(),
            app_remaining: apps.iter().map(Buffer::remaining).sum(),
            net,
            apps,
        }
    }

    pub fn net(&self) -> &Buffer {
        &*self.net
    }

    /// Application bytes still available (wrap) or room left (unwrap).
    pub fn app_remaining(&self) -> usize {
        self.app_remaining
    }

    /// Copy up to `space_left` application bytes into the network buffer
    /// at its position. Returns the number moved.
    pub fn gather(&mut self, space_left: usize) -> Result<usize, TlsError> {
        let mut space_left = space_left.min(self.app_remaining);
        if space_left > self.net.remaining() {
            return Err(TlsError::Internal(format!(
                "gather of {space_left} bytes into {} bytes of network space",
                self.net.remaining()
            )));
        }
        let mut moved = 0;
        for app in self.apps.iter_mut() {
            if space_left == 0 {
                break;
            }
            let amount = app.remaining().min(space_left);
            if amount == 0 {
                continue;
            }
            app.set_limit(app.position() + amount)?;
            self.net.put(app.as_slice())?;
            app.set_position(app.limit())?;
            self.app_remaining -= amount;
            space_left -= amount;
            moved += amount;
        }
        Ok(moved)
    }

    /// Copy `ready` into the application buffers in order.
    pub fn scatter(&mut self, ready: &[u8]) -> Result<(), TlsError> {
        scatter_into(self.apps, ready)?;
        self.app_remaining -= ready.len();
        Ok(())
    }

    /// Scatter bytes that live in the network buffer's storage.
    pub fn scatter_net_range(&mut self, range: Range<usize>) -> Result<(), TlsError> {
        let len = range.len();
        let src = self
            .net
            .storage()
            .get(range)
            .ok_or_else(|| TlsError::Internal("plaintext range outside network buffer".into()))?;
        scatter_into(self.apps, src)?;
        self.app_remaining -= len;
        Ok(())
    }

    /// Network bytes produced (wrap) or consumed (unwrap) so far.
    pub fn delta_net(&self) -> usize {
        self.net.position() - self.net_pos
    }

    /// Application bytes consumed (wrap) or produced (unwrap) so far.
    pub fn delta_app(&self) -> usize {
        self.apps
            .iter()
            .zip(&self.app_pos)
            .map(|(app, start)| app.position() - start)
            .sum()
    }

    /// Restore every position saved at construction.
    pub fn reset_pos(&mut self) {
        self.net.restore(self.net_pos, self.net.limit().max(self.net_pos));
        for (app, &pos) in self.apps.iter_mut().zip(&self.app_pos) {
            app.restore(pos, app.limit().max(pos));
        }
        self.app_remaining = self.apps.iter().map(Buffer::remaining).sum();
    }

    /// Restore every limit saved at construction.
    pub fn reset_lim(&mut self) {
        self.net.restore(self.net.position(), self.net_lim);
        for (app, &lim) in self.apps.iter_mut().zip(&self.app_lim) {
            app.restore(app.position(), lim);
        }
    }

    /// Run `f`, then restore limits; on error also restore positions.
    pub fn guarded<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T, TlsError>,
    ) -> Result<T, TlsError> {
        let result = f(self);
        self.reset_lim();
        if result.is_err() {
            self.reset_pos();
        }
        result
    }
}

fn sub_range(apps: &mut [Buffer], offset: usize, len: usize) -> Result<&mut [Buffer], TlsError> {
    if offset > apps.len() || len > apps.len() - offset {
        return Err(TlsError::InvalidBuffer(format!(
            "offset {offset} / length {len} outside {} application buffers",
            apps.len()
        )));
    }
    Ok(&mut apps[offset..offset + len])
}

fn scatter_into(apps: &mut [Buffer], ready: &[u8]) -> Result<(), TlsError> {
    let room: usize = apps.iter().map(Buffer::remaining).sum();
    if room < ready.len() {
        return Err(TlsError::Internal(format!(
            "{} plaintext bytes for {room} bytes of application space",
            ready.len()
        )));
    }
    let mut rest = ready;
    for app in apps.iter_mut() {
        if rest.is_empty() {
            break;
        }
        let n = app.remaining().min(rest.len());
        app.put(&rest[..n])?;
        rest = &rest[n..];
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sized(remaining: &[usize]) -> Vec<Buffer> {
        remaining.iter().map(|&n| Buffer::allocate(n)).collect()
    }

    #[test]
    fn test_scatter_splits_across_buffers() {
        let mut net = Buffer::allocate(0);
        let mut apps = sized(&[5, 10]);
        let data: Vec<u8> = (1..=12).collect();
        {
            let mut args = EngineArgs::for_unwrap(&mut net, &mut apps, 0, 2).unwrap();
            args.scatter(&data).unwrap();
            assert_eq!(args.delta_app(), 12);
            assert_eq!(args.app_remaining(), 3);
        }
        assert_eq!(apps[0].position(), 5);
        assert_eq!(apps[1].position(), 7);
        assert_eq!(&apps[0].storage()[..5], &data[..5]);
        assert_eq!(&apps[1].storage()[..7], &data[5..]);
    }

    #[test]
    fn test_gather_splits_across_buffers() {
        let mut net = Buffer::allocate(32);
        let mut apps = vec![Buffer::wrap((1..=5).collect()), Buffer::wrap((6..=15).collect())];
        {
            let mut args = EngineArgs::for_wrap(&mut apps, 0, 2, &mut net).unwrap();
            assert_eq!(args.app_remaining(), 15);
            assert_eq!(args.gather(12).unwrap(), 12);
            args.reset_lim();
            assert_eq!(args.delta_app(), 12);
            assert_eq!(args.delta_net(), 12);
        }
        assert_eq!(&net.storage()[..12], &(1..=12).collect::<Vec<u8>>()[..]);
        assert_eq!(apps[0].remaining(), 0);
        assert_eq!(apps[1].remaining(), 3);
        assert_eq!(apps[1].limit(), 10);
    }

    #[test]
    fn test_construction_rejects_bad_ranges() {
        let mut net = Buffer::allocate(16);
        let mut apps = sized(&[4, 4]);
        assert!(matches!(
            EngineArgs::for_wrap(&mut apps, 1, 2, &mut net),
            Err(TlsError::InvalidBuffer(_))
        ));
        assert!(matches!(
            EngineArgs::for_unwrap(&mut net, &mut apps, 3, 0),
            Err(TlsError::InvalidBuffer(_))
        ));
        assert!(matches!(
            EngineArgs::for_wrap(&mut apps, usize::MAX, 2, &mut net),
            Err(TlsError::InvalidBuffer(_))
        ));
        // Empty sub-range at the end is fine.
        assert!(EngineArgs::for_wrap(&mut apps, 2, 0, &mut net).is_ok());
    }

    #[test]
    fn test_construction_rejects_read_only() {
        let mut ro_net = Buffer::allocate(16).into_read_only();
        let mut apps = sized(&[4]);
        assert!(matches!(
            EngineArgs::for_wrap(&mut apps, 0, 1, &mut ro_net),
            Err(TlsError::ReadOnlyBuffer)
        ));
        let mut net = Buffer::allocate(16);
        let mut ro_apps = vec![Buffer::allocate(4), Buffer::allocate(4).into_read_only()];
        assert!(matches!(
            EngineArgs::for_unwrap(&mut net, &mut ro_apps, 0, 2),
            Err(TlsError::ReadOnlyBuffer)
        ));
        // Read-only buffers outside the sub-range are never touched.
        assert!(EngineArgs::for_unwrap(&mut net, &mut ro_apps, 0, 1).is_ok());
        // A read-only network buffer is acceptable on unwrap.
        assert!(EngineArgs::for_unwrap(&mut ro_net, &mut apps, 0, 1).is_ok());
    }

    #[test]
    fn test_guarded_rolls_back_on_error() {
        let mut net = Buffer::allocate(32);
        let mut apps = vec![Buffer::wrap(vec![7u8; 10])];
        {
            let mut args = EngineArgs::for_wrap(&mut apps, 0, 1, &mut net).unwrap();
            let result: Result<(), TlsError> = args.guarded(|a| {
                a.net.set_limit(20)?;
                a.gather(6)?;
                Err(TlsError::BadRecordMac)
            });
            assert!(result.is_err());
            assert_eq!(args.delta_net(), 0);
            assert_eq!(args.delta_app(), 0);
            assert_eq!(args.app_remaining(), 10);
        }
        assert_eq!(net.position(), 0);
        assert_eq!(net.limit(), 32);
        assert_eq!(apps[0].position(), 0);
        assert_eq!(apps[0].limit(), 10);
    }

    #[test]
    fn test_guarded_keeps_positions_on_success() {
        let mut net = Buffer::allocate(32);
        let mut apps = vec![Buffer::wrap(vec![7u8; 10])];
        let mut args = EngineArgs::for_wrap(&mut apps, 0, 1, &mut net).unwrap();
        let moved = args.guarded(|a| a.gather(4)).unwrap();
        assert_eq!(moved, 4);
        assert_eq!(args.delta_net(), 4);
        assert_eq!(args.net().limit(), 32);
    }

    #[test]
    fn test_scatter_overflow_is_internal() {
        let mut net = Buffer::allocate(0);
        let mut apps = sized(&[2]);
        let mut args = EngineArgs::for_unwrap(&mut net, &mut apps, 0, 1).unwrap();
        assert!(matches!(args.scatter(&[1, 2, 3]), Err(TlsError::Internal(_))));
        assert_eq!(args.delta_app(), 0);
    }
}
